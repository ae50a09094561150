use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::Embedder;
use crate::config::AppConfig;
use crate::core::errors::PipelineError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini embedContent client.
#[derive(Clone)]
pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    dimension: usize,
    client: Client,
}

impl GeminiEmbedder {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dim,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let body = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
            "taskType": "RETRIEVAL_DOCUMENT",
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Embedding(format!(
                "embedContent error: {}",
                text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Embedding(e.to_string()))?;

        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| PipelineError::Embedding("missing embedding values".to_string()))?;

        Ok(values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
