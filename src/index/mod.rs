//! Vector index abstraction.
//!
//! The pipeline treats the index as an opaque nearest-neighbor store keyed by
//! numeric id, holding a fixed-dimension vector plus the full ingested row as
//! payload. The primary implementation is `QdrantIndex` in the `qdrant`
//! module.

mod qdrant;

pub use qdrant::QdrantIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;

/// One ingested data row: column name to scalar value (string, number or
/// null). Immutable once stored.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Similarity score (higher is more similar).
    pub score: f32,
    /// The stored row.
    pub payload: Record,
}

/// Abstract trait for vector index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Whether the collection has been created.
    async fn exists(&self) -> Result<bool, PipelineError>;

    /// Number of stored points.
    async fn count(&self) -> Result<usize, PipelineError>;

    /// Drop and recreate the collection. Ingestion uses replace-all
    /// semantics; there is no incremental update.
    async fn recreate(&self) -> Result<(), PipelineError>;

    /// Upsert a batch of `(id, vector, payload)` points.
    async fn upsert_batch(
        &self,
        points: Vec<(u64, Vec<f32>, Record)>,
    ) -> Result<(), PipelineError>;

    /// Top-k cosine similarity search, ranked descending by score.
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>, PipelineError>;
}


#[cfg(test)]
mod tests {
    use super::testing::InMemoryIndex;
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let index = InMemoryIndex::new();
        index.recreate().await.unwrap();
        index
            .upsert_batch(vec![
                (0, vec![1.0, 0.0, 0.0], record(&[("final location", json!("Wakad"))])),
                (1, vec![0.0, 1.0, 0.0], record(&[("final location", json!("Aundh"))])),
            ])
            .await
            .unwrap();

        let hits = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload["final location"], json!("Wakad"));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn recreate_clears_all_points() {
        let index = InMemoryIndex::new();
        assert!(!index.exists().await.unwrap());
        index.recreate().await.unwrap();
        index
            .upsert_batch(vec![(0, vec![1.0, 0.0, 0.0], Record::new())])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 1);

        index.recreate().await.unwrap();
        assert!(index.exists().await.unwrap());
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
