use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Qdrant REST endpoint.
    pub qdrant_url: String,
    /// Optional Qdrant API key (sent as `api-key` header).
    pub qdrant_api_key: Option<String>,
    /// Gemini API key for embedding and generation.
    pub gemini_api_key: String,
    /// Collection holding the ingested rows.
    pub collection_name: String,
    /// Embedding dimension (text-embedding-004 produces 768).
    pub embedding_dim: usize,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Generation model identifier.
    pub generation_model: String,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    /// HTTP bind port (0 picks a free port).
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_api_key: None,
            gemini_api_key: String::new(),
            collection_name: "realestate".to_string(),
            embedding_dim: 768,
            embedding_model: "text-embedding-004".to_string(),
            generation_model: "gemini-2.5-flash-lite".to_string(),
            log_dir: PathBuf::from("logs"),
            port: 8000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            qdrant_url: env::var("QDRANT_URL").unwrap_or(defaults.qdrant_url),
            qdrant_api_key: env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            collection_name: env::var("COLLECTION_NAME").unwrap_or(defaults.collection_name),
            embedding_dim: defaults.embedding_dim,
            embedding_model: env::var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            generation_model: env::var("GENERATION_MODEL").unwrap_or(defaults.generation_model),
            log_dir: env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            port: env::var("PORT")
                .ok()
                .and_then(|val| val.parse::<u16>().ok())
                .unwrap_or(defaults.port),
        };

        let _ = fs::create_dir_all(&config.log_dir);
        config
    }
}
