//! Qdrant vector index implementation over the REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{Record, SearchHit, VectorIndex};
use crate::config::AppConfig;
use crate::core::errors::PipelineError;

#[derive(Clone)]
pub struct QdrantIndex {
    base_url: String,
    api_key: Option<String>,
    collection: String,
    dimension: usize,
    client: Client,
}

impl QdrantIndex {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            api_key: config.qdrant_api_key.clone(),
            collection: config.collection_name.clone(),
            dimension: config.embedding_dim,
            client: Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, &url);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn read_result(response: reqwest::Response) -> Result<Value, PipelineError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Index(e.to_string()))?;
        if !status.is_success() {
            return Err(PipelineError::Index(format!(
                "qdrant returned {}: {}",
                status, body
            )));
        }
        Ok(body["result"].clone())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn exists(&self) -> Result<bool, PipelineError> {
        let path = format!("/collections/{}/exists", self.collection);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| PipelineError::Index(e.to_string()))?;
        let result = Self::read_result(response).await?;
        Ok(result["exists"].as_bool().unwrap_or(false))
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        let path = format!("/collections/{}", self.collection);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| PipelineError::Index(e.to_string()))?;
        let result = Self::read_result(response).await?;
        Ok(result["points_count"].as_u64().unwrap_or(0) as usize)
    }

    async fn recreate(&self) -> Result<(), PipelineError> {
        // Best-effort drop; the collection may not exist yet.
        let path = format!("/collections/{}", self.collection);
        let _ = self.request(reqwest::Method::DELETE, &path).send().await;

        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&json!({
                "vectors": { "size": self.dimension, "distance": "Cosine" }
            }))
            .send()
            .await
            .map_err(|e| PipelineError::Index(e.to_string()))?;
        Self::read_result(response).await?;
        tracing::info!("Recreated Qdrant collection '{}'", self.collection);
        Ok(())
    }

    async fn upsert_batch(
        &self,
        points: Vec<(u64, Vec<f32>, Record)>,
    ) -> Result<(), PipelineError> {
        let body = json!({
            "points": points
                .into_iter()
                .map(|(id, vector, payload)| json!({
                    "id": id,
                    "vector": vector,
                    "payload": payload,
                }))
                .collect::<Vec<Value>>()
        });

        let path = format!("/collections/{}/points?wait=true", self.collection);
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Index(e.to_string()))?;
        Self::read_result(response).await?;
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>, PipelineError> {
        let path = format!("/collections/{}/points/query", self.collection);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({
                "query": vector,
                "limit": limit,
                "with_payload": true,
            }))
            .send()
            .await
            .map_err(|e| PipelineError::Index(e.to_string()))?;
        let result = Self::read_result(response).await?;

        let hits = result["points"]
            .as_array()
            .map(|points| {
                points
                    .iter()
                    .map(|point| SearchHit {
                        score: point["score"].as_f64().unwrap_or(0.0) as f32,
                        payload: point["payload"]
                            .as_object()
                            .cloned()
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(hits)
    }
}
