use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of the pipeline's collaborators. These propagate to the routing
/// layer; they are never masked by the normalizer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The vector index is missing or uninitialized.
    #[error("no data indexed: {0}")]
    Retrieval(String),
    /// The embedding collaborator failed.
    #[error("embedding failed: {0}")]
    Embedding(String),
    /// The vector index rejected an operation.
    #[error("index error: {0}")]
    Index(String),
    /// The generation collaborator failed.
    #[error("generation failed: {0}")]
    Generation(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Retrieval(_) => ApiError::BadRequest(
                "No data found in the index. Please upload a file first.".to_string(),
            ),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
