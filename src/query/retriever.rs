//! Context retrieval: embed the query, fetch top-k payloads from the index.

use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::embedding::Embedder;
use crate::index::{Record, VectorIndex};

pub const DEFAULT_TOP_K: usize = 10;

pub struct ContextRetriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl ContextRetriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Retrieve the payloads of the top-k most similar records, ranked by
    /// similarity.
    ///
    /// Fails with `PipelineError::Retrieval` when the index is absent. An
    /// empty result is not an error; the caller treats it as a distinct
    /// "no data" condition.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Record>, PipelineError> {
        let top_k = top_k.max(1);

        if !self.index.exists().await? {
            return Err(PipelineError::Retrieval(
                "vector index has not been created".to_string(),
            ));
        }

        let vector = self.embedder.embed(query).await?;
        let hits = self.index.search(&vector, top_k).await?;

        tracing::debug!("Retrieved {} context records for query", hits.len());
        Ok(hits.into_iter().map(|hit| hit.payload).collect())
    }
}
