use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::embedding::{Embedder, GeminiEmbedder};
use crate::index::{QdrantIndex, VectorIndex};
use crate::llm::{GeminiGenerator, Generator};
use crate::query::QueryEngine;

pub struct AppState {
    pub config: AppConfig,
    pub index: Arc<dyn VectorIndex>,
    pub embedder: Arc<dyn Embedder>,
    pub engine: QueryEngine,
    #[allow(dead_code)]
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn initialize(config: AppConfig) -> Arc<Self> {
        let index: Arc<dyn VectorIndex> = Arc::new(QdrantIndex::new(&config));
        let embedder: Arc<dyn Embedder> = Arc::new(GeminiEmbedder::new(&config));
        let generator: Arc<dyn Generator> = Arc::new(GeminiGenerator::new(&config));
        Self::with_collaborators(config, index, embedder, generator)
    }

    /// Wire the state from explicit collaborators (used by tests).
    pub fn with_collaborators(
        config: AppConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Arc<Self> {
        let engine = QueryEngine::new(index.clone(), embedder.clone(), generator);
        Arc::new(AppState {
            config,
            index,
            embedder,
            engine,
            started_at: Utc::now(),
        })
    }
}
