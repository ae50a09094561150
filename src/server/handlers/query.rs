use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::query::{QueryOutcome, DEFAULT_TOP_K};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    pub top_k: Option<usize>,
}

pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Query parameter is required".to_string(),
        ));
    }

    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
    match state.engine.answer_query(&request.query, top_k).await? {
        QueryOutcome::Answer(payload) => Ok(Json(payload)),
        QueryOutcome::NoData => Err(ApiError::NotFound(
            "No relevant data found for your query. Try different keywords.".to_string(),
        )),
    }
}
