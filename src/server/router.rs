use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{data, health, query};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/check-data", get(data::check_data))
        .route("/api/upload-csv", post(data::upload_csv))
        .route("/api/query", post(query::run_query))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}
