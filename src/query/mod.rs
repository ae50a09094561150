//! Query-answering pipeline.
//!
//! Control flow for one query: classifier → retriever → prompt builder →
//! generator → normalizer (→ chart-data repair on malformed output) →
//! `AnswerPayload`.

pub mod classifier;
pub mod engine;
pub mod normalizer;
pub mod prompt;
pub mod repair;
pub mod retriever;
pub mod types;

pub use engine::QueryEngine;
pub use retriever::DEFAULT_TOP_K;
pub use types::{AnswerPayload, ChartSpec, ChartType, IntentSignals, QueryOutcome};
