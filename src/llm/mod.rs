//! Generation abstraction.
//!
//! A `Generator` is invoked with a fully built prompt and sampling parameters
//! and returns free-form text expected to contain JSON. The primary
//! implementation is `GeminiGenerator`.

mod gemini;

pub use gemini::GeminiGenerator;

use async_trait::async_trait;

use crate::core::errors::PipelineError;

/// Sampling parameters for one completion.
///
/// The query pipeline runs low temperature: structural compliance matters
/// more than creativity.
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.8,
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Text completion (non-streaming). No retry on failure; errors surface
    /// as `PipelineError::Generation`.
    async fn complete(
        &self,
        prompt: &str,
        sampling: SamplingConfig,
    ) -> Result<String, PipelineError>;
}
