use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{Generator, SamplingConfig};
use crate::config::AppConfig;
use crate::core::errors::PipelineError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini generateContent client.
#[derive(Clone)]
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            model: config.generation_model.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn complete(
        &self,
        prompt: &str,
        sampling: SamplingConfig,
    ) -> Result<String, PipelineError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": sampling.temperature,
                "topP": sampling.top_p,
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Generation(format!(
                "generateContent error: {}",
                text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| PipelineError::Generation("empty candidate text".to_string()))?;

        Ok(text.trim().to_string())
    }
}
