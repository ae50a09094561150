//! Embedding abstraction.
//!
//! Maps text to a fixed-dimension vector. The primary implementation is
//! `GeminiEmbedder` (text-embedding-004, 768 dimensions).

mod gemini;

pub use gemini::GeminiEmbedder;

use async_trait::async_trait;

use crate::core::errors::PipelineError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;

    /// The vector dimension this embedder produces.
    fn dimension(&self) -> usize;
}
