use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::index::Record;

/// Boolean intent signals derived from the raw query by keyword membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSignals {
    pub is_comparison: bool,
    pub is_trend: bool,
    pub has_total: bool,
}

/// The only chart types the contract admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bar" => Some(ChartType::Bar),
            "line" => Some(ChartType::Line),
            _ => None,
        }
    }
}

/// Chart payload: a type plus an ordered sequence of rows. Each row's first
/// key is the category/time dimension, the remaining keys numeric metrics;
/// all rows of one chart share an identical key set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartType,
    pub data: Vec<Value>,
}

impl ChartSpec {
    pub fn empty(kind: ChartType) -> Self {
        Self { kind, data: vec![] }
    }
}

/// The sole externally visible result of the pipeline. Produced fresh per
/// query, never mutated after construction. Tables are capped at 10 rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub summary: String,
    pub chart: ChartSpec,
    pub table: Vec<Record>,
}

/// Outcome of `answer_query`: either an answer, or a typed "no data" sentinel
/// when the index exists but retrieval matched nothing.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Answer(AnswerPayload),
    NoData,
}
