//! The query pipeline: classify → retrieve → prompt → generate → normalize.

use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::llm::{Generator, SamplingConfig};

use super::classifier::classify;
use super::normalizer::normalize;
use super::prompt::build_prompt;
use super::retriever::ContextRetriever;
use super::types::QueryOutcome;

pub struct QueryEngine {
    retriever: ContextRetriever,
    generator: Arc<dyn Generator>,
}

impl QueryEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            retriever: ContextRetriever::new(index, embedder),
            generator,
        }
    }

    /// Answer a natural-language query against the ingested data.
    ///
    /// One synchronous unit of work, no internal parallelism. Collaborator
    /// failures (index absent, embedder or generator unreachable) propagate
    /// as typed errors; malformed model output never does — the normalizer
    /// absorbs it.
    pub async fn answer_query(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<QueryOutcome, PipelineError> {
        let signals = classify(query);
        let recommended = signals.recommended_chart();
        tracing::debug!(
            "Classified query: comparison={} trend={} total={} chart={}",
            signals.is_comparison,
            signals.is_trend,
            signals.has_total,
            recommended.as_str()
        );

        let context = self.retriever.retrieve(query, top_k).await?;
        if context.is_empty() {
            return Ok(QueryOutcome::NoData);
        }

        let prompt = build_prompt(query, &signals, recommended, &context);
        let raw = self
            .generator
            .complete(&prompt, SamplingConfig::default())
            .await?;

        let payload = normalize(&raw, &context, recommended).into_payload();
        Ok(QueryOutcome::Answer(payload))
    }
}
