use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::ingest::{self, IngestError};
use crate::state::AppState;

/// Report whether the collection exists and how many points it holds.
pub async fn check_data(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    if state.index.exists().await.map_err(ApiError::internal)? {
        let points_count = state.index.count().await.map_err(ApiError::internal)?;
        Ok(Json(json!({
            "exists": true,
            "points_count": points_count,
            "message": "Data already loaded in the index",
        })))
    } else {
        Ok(Json(json!({
            "exists": false,
            "message": "No data found. Please upload a file.",
        })))
    }
}

/// Multipart CSV upload. Replace-all ingestion: the previous collection is
/// dropped before the new rows are embedded and upserted.
pub async fn upload_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file_name = None;
    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|name| name.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
            file_bytes = Some(bytes);
            break;
        }
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let rows = ingest::parse_upload(file_name.as_deref(), &bytes).map_err(map_ingest_error)?;
    let summary = ingest::replace_all(state.index.as_ref(), state.embedder.as_ref(), rows)
        .await
        .map_err(map_ingest_error)?;

    Ok(Json(json!({
        "message": "File uploaded and embedded!",
        "rows_processed": summary.rows_processed,
        "columns": summary.columns,
    })))
}

fn map_ingest_error(err: IngestError) -> ApiError {
    match err {
        IngestError::EmptyFile => ApiError::BadRequest("File is empty".to_string()),
        IngestError::MissingColumns {
            missing,
            found,
            total_columns,
        } => ApiError::BadRequest(format!(
            "Missing required columns: {:?} (found {:?} of {} columns)",
            missing, found, total_columns
        )),
        IngestError::Csv(msg) => ApiError::BadRequest(msg),
        IngestError::Excel(msg) => ApiError::BadRequest(msg),
        err @ IngestError::UnsupportedFormat => ApiError::BadRequest(err.to_string()),
        IngestError::Pipeline(err) => ApiError::internal(err),
    }
}
