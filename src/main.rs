use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use estatelens_backend::config::AppConfig;
use estatelens_backend::logging;
use estatelens_backend::server::router::router;
use estatelens_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logging::init(&config);

    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; embedding and generation will fail");
    }

    let bind_addr = format!("127.0.0.1:{}", config.port);
    let state = AppState::initialize(config);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
