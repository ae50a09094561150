//! Response normalization.
//!
//! The single boundary where "the model said something wrong" is absorbed:
//! fence stripping, JSON parsing, schema repair, chart-type validation and
//! chart-data restructuring all happen here, and every failure mode collapses
//! into a well-formed `AnswerPayload`. Callers never see a malformed-response
//! error.

use serde_json::Value;
use thiserror::Error;

use super::repair::restructure_chart_data;
use super::types::{AnswerPayload, ChartSpec, ChartType};
use crate::index::Record;

/// Tables are capped at this many rows.
pub const MAX_TABLE_ROWS: usize = 10;

/// Fallback summaries longer than this are replaced by a fixed message.
const MAX_FALLBACK_SUMMARY_CHARS: usize = 500;

const FALLBACK_SUMMARY: &str =
    "Analysis could not be completed. Please rephrase your query.";

/// What the normalizer had to do to produce a valid payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairWarning {
    MissingSummary,
    MissingChart,
    MissingChartData,
    MissingChartType,
    MissingTable,
    InvalidChartType(String),
    LegacyChartShape,
    InconsistentRowKeys,
    TableTruncated,
}

/// Tagged result of normalization. `Clean` round-trips the model output
/// untouched; `Repaired` carries the applied fixes; `Fallback` is the
/// terminal path when the output could not be parsed at all.
#[derive(Debug, Clone)]
pub enum NormalizeOutcome {
    Clean(AnswerPayload),
    Repaired(AnswerPayload, Vec<RepairWarning>),
    Fallback(AnswerPayload),
}

impl NormalizeOutcome {
    pub fn into_payload(self) -> AnswerPayload {
        match self {
            NormalizeOutcome::Clean(payload) => payload,
            NormalizeOutcome::Repaired(payload, _) => payload,
            NormalizeOutcome::Fallback(payload) => payload,
        }
    }

    pub fn payload(&self) -> &AnswerPayload {
        match self {
            NormalizeOutcome::Clean(payload) => payload,
            NormalizeOutcome::Repaired(payload, _) => payload,
            NormalizeOutcome::Fallback(payload) => payload,
        }
    }
}

#[derive(Debug, Error)]
enum NormalizeError {
    #[error("model response is not a JSON object")]
    NotAnObject,
    #[error("chart is not a JSON object")]
    ChartNotAnObject,
    #[error("table row is not a JSON object")]
    TableRowNotAnObject,
}

/// Normalize raw generator output into an `AnswerPayload`.
///
/// Total over its input domain: any string (valid JSON, invalid JSON, empty,
/// prose) yields a well-formed payload. `context` supplies the default table
/// and the chart-data repair source; `recommended` is the classifier's chart
/// type from the prompt.
pub fn normalize(raw: &str, context: &[Record], recommended: ChartType) -> NormalizeOutcome {
    let stripped = strip_code_fences(raw);

    let parsed: Value = match serde_json::from_str(&stripped) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("Model output was not valid JSON: {}", err);
            let summary = if stripped.chars().count() < MAX_FALLBACK_SUMMARY_CHARS {
                stripped
            } else {
                FALLBACK_SUMMARY.to_string()
            };
            return NormalizeOutcome::Fallback(AnswerPayload {
                summary,
                chart: ChartSpec::empty(recommended),
                table: default_table(context),
            });
        }
    };

    match repair(parsed, context, recommended) {
        Ok((payload, warnings)) if warnings.is_empty() => NormalizeOutcome::Clean(payload),
        Ok((payload, warnings)) => {
            tracing::debug!("Model output repaired: {:?}", warnings);
            NormalizeOutcome::Repaired(payload, warnings)
        }
        Err(err) => {
            tracing::warn!("Model output could not be repaired: {}", err);
            NormalizeOutcome::Fallback(AnswerPayload {
                summary: format!("Analysis could not be completed: {}.", err),
                chart: ChartSpec::empty(recommended),
                table: default_table(context),
            })
        }
    }
}

/// Remove code-fence markers, tolerant of either the bare and the
/// language-tagged style.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.replace("```", "").trim().to_string()
}

fn default_table(context: &[Record]) -> Vec<Record> {
    context.iter().take(MAX_TABLE_ROWS).cloned().collect()
}

/// Steps 3-6 of normalization: schema defaults, chart-type validation,
/// legacy-shape restructuring, key-consistency check.
fn repair(
    parsed: Value,
    context: &[Record],
    recommended: ChartType,
) -> Result<(AnswerPayload, Vec<RepairWarning>), NormalizeError> {
    let mut object = match parsed {
        Value::Object(object) => object,
        _ => return Err(NormalizeError::NotAnObject),
    };
    let mut warnings = Vec::new();

    let summary = match object.get("summary").and_then(|v| v.as_str()) {
        Some(summary) => summary.to_string(),
        None => {
            warnings.push(RepairWarning::MissingSummary);
            "Analysis complete.".to_string()
        }
    };

    let chart = match object.remove("chart") {
        None | Some(Value::Null) => {
            warnings.push(RepairWarning::MissingChart);
            ChartSpec::empty(recommended)
        }
        Some(Value::Object(mut chart)) => {
            let kind = match chart.get("type").and_then(|v| v.as_str()) {
                Some(raw_type) => match ChartType::parse(raw_type) {
                    Some(kind) => kind,
                    None => {
                        warnings.push(RepairWarning::InvalidChartType(raw_type.to_string()));
                        recommended
                    }
                },
                None => {
                    warnings.push(RepairWarning::MissingChartType);
                    recommended
                }
            };

            let mut data = match chart.remove("data") {
                Some(Value::Array(data)) => data,
                _ => {
                    warnings.push(RepairWarning::MissingChartData);
                    vec![]
                }
            };

            if uses_legacy_shape(&data) {
                warnings.push(RepairWarning::LegacyChartShape);
                data = restructure_chart_data(&data, context);
            }

            if has_inconsistent_keys(&data) {
                // Detected but deliberately not repaired; the data passes
                // through as-is.
                tracing::warn!("Chart rows do not share an identical key set");
                warnings.push(RepairWarning::InconsistentRowKeys);
            }

            ChartSpec { kind, data }
        }
        Some(_) => return Err(NormalizeError::ChartNotAnObject),
    };

    let table = match object.remove("table") {
        Some(Value::Array(rows)) if !rows.is_empty() => {
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                match row {
                    Value::Object(record) => records.push(record),
                    _ => return Err(NormalizeError::TableRowNotAnObject),
                }
            }
            if records.len() > MAX_TABLE_ROWS {
                warnings.push(RepairWarning::TableTruncated);
                records.truncate(MAX_TABLE_ROWS);
            }
            records
        }
        _ => {
            warnings.push(RepairWarning::MissingTable);
            default_table(context)
        }
    };

    Ok((
        AnswerPayload {
            summary,
            chart,
            table,
        },
        warnings,
    ))
}

/// The legacy/incorrect shape carries `label`/`metric` keys in its first row.
fn uses_legacy_shape(data: &[Value]) -> bool {
    data.first()
        .and_then(|row| row.as_object())
        .map(|row| row.contains_key("label") || row.contains_key("metric"))
        .unwrap_or(false)
}

fn has_inconsistent_keys(data: &[Value]) -> bool {
    if data.len() < 2 {
        return false;
    }
    let first_keys: Vec<&String> = match data[0].as_object() {
        Some(row) => row.keys().collect(),
        None => return true,
    };
    data[1..].iter().any(|row| match row.as_object() {
        Some(row) => {
            let keys: Vec<&String> = row.keys().collect();
            keys.len() != first_keys.len() || keys.iter().any(|k| !first_keys.contains(k))
        }
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn context() -> Vec<Record> {
        vec![
            record(&[("final location", json!("Wakad")), ("year", json!(2021))]),
            record(&[("final location", json!("Aundh")), ("year", json!(2022))]),
        ]
    }

    #[test]
    fn well_formed_output_round_trips_clean() {
        let raw = r#"{
            "summary": "Wakad averaged 5650 per sqft in 2021, up 8% from 2020. Aundh stayed flat.",
            "chart": {"type": "line", "data": [{"year": 2020, "Wakad": 5200}, {"year": 2021, "Wakad": 5650}]},
            "table": [{"Location": "Wakad", "Year": 2021, "Flat Rate": 5650}]
        }"#;

        let outcome = normalize(raw, &context(), ChartType::Line);
        let NormalizeOutcome::Clean(payload) = outcome else {
            panic!("expected clean outcome, got {:?}", outcome);
        };
        assert_eq!(payload.chart.kind, ChartType::Line);
        assert_eq!(payload.chart.data.len(), 2);
        assert_eq!(payload.table.len(), 1);
        assert!(payload.summary.starts_with("Wakad averaged"));
    }

    #[test]
    fn fenced_output_is_stripped_before_parsing() {
        let raw = "```json\n{\"summary\":\"ok\",\"chart\":{\"type\":\"bar\",\"data\":[]},\"table\":[]}\n```";
        let outcome = normalize(raw, &[], ChartType::Bar);
        let payload = outcome.payload();
        assert_eq!(payload.summary, "ok");
        assert_eq!(payload.chart.kind, ChartType::Bar);
        assert!(payload.chart.data.is_empty());
        assert!(payload.table.is_empty());
    }

    #[test]
    fn bare_fence_style_is_also_stripped() {
        let raw = "```\n{\"summary\":\"ok\",\"chart\":{\"type\":\"line\",\"data\":[]},\"table\":[{\"a\":1}]}\n```";
        let payload = normalize(raw, &context(), ChartType::Line).into_payload();
        assert_eq!(payload.summary, "ok");
        assert_eq!(payload.table.len(), 1);
    }

    #[test]
    fn invalid_json_falls_back_with_raw_text_as_summary() {
        let outcome = normalize("not json at all", &context(), ChartType::Bar);
        let NormalizeOutcome::Fallback(payload) = outcome else {
            panic!("expected fallback");
        };
        assert_eq!(payload.summary, "not json at all");
        assert_eq!(payload.chart.kind, ChartType::Bar);
        assert!(payload.chart.data.is_empty());
        assert_eq!(payload.table.len(), 2);
    }

    #[test]
    fn long_invalid_output_gets_fixed_fallback_summary() {
        let raw = "x".repeat(600);
        let payload = normalize(&raw, &[], ChartType::Line).into_payload();
        assert_eq!(payload.summary, FALLBACK_SUMMARY);
    }

    #[test]
    fn normalizer_is_total_over_arbitrary_input() {
        for raw in ["", "{", "[]", "42", "null", "{\"chart\": \"nope\"}"] {
            let payload = normalize(raw, &context(), ChartType::Bar).into_payload();
            assert!(matches!(payload.chart.kind, ChartType::Bar | ChartType::Line));
            assert!(payload.table.len() <= MAX_TABLE_ROWS);
        }
    }

    #[test]
    fn missing_fields_get_defaults() {
        let payload = normalize("{}", &context(), ChartType::Bar).into_payload();
        assert_eq!(payload.summary, "Analysis complete.");
        assert_eq!(payload.chart.kind, ChartType::Bar);
        assert!(payload.chart.data.is_empty());
        // Default table is the first 10 context records.
        assert_eq!(payload.table.len(), 2);
    }

    #[test]
    fn unknown_chart_type_is_overwritten_with_recommendation() {
        let raw = r#"{"summary":"s","chart":{"type":"pie","data":[]},"table":[{"a":1}]}"#;
        let outcome = normalize(raw, &context(), ChartType::Line);
        let NormalizeOutcome::Repaired(payload, warnings) = outcome else {
            panic!("expected repaired outcome");
        };
        assert_eq!(payload.chart.kind, ChartType::Line);
        assert!(warnings.contains(&RepairWarning::InvalidChartType("pie".to_string())));
    }

    #[test]
    fn chart_without_type_gets_recommendation() {
        let raw = r#"{"summary":"s","chart":{"data":[{"year":2020,"A":1}]},"table":[{"a":1}]}"#;
        let outcome = normalize(raw, &context(), ChartType::Line);
        let NormalizeOutcome::Repaired(payload, warnings) = outcome else {
            panic!("expected repaired outcome");
        };
        assert_eq!(payload.chart.kind, ChartType::Line);
        assert!(warnings.contains(&RepairWarning::MissingChartType));
    }

    #[test]
    fn legacy_label_metric_shape_is_restructured() {
        let raw = r#"{
            "summary": "s",
            "chart": {"type": "line", "data": [{"label": "Wakad 2021", "metric": 5000}]},
            "table": [{"a": 1}]
        }"#;
        let outcome = normalize(raw, &context(), ChartType::Line);
        let NormalizeOutcome::Repaired(payload, warnings) = outcome else {
            panic!("expected repaired outcome");
        };
        assert!(warnings.contains(&RepairWarning::LegacyChartShape));
        assert_eq!(payload.chart.data, vec![json!({"year": 2021, "Wakad": 5000})]);
    }

    #[test]
    fn inconsistent_row_keys_pass_through_but_warn() {
        let raw = r#"{
            "summary": "s",
            "chart": {"type": "line", "data": [{"year": 2020, "A": 1}, {"year": 2020, "B": 2}]},
            "table": [{"a": 1}]
        }"#;
        let outcome = normalize(raw, &context(), ChartType::Line);
        let NormalizeOutcome::Repaired(payload, warnings) = outcome else {
            panic!("expected repaired outcome");
        };
        assert!(warnings.contains(&RepairWarning::InconsistentRowKeys));
        // Data is flagged, not modified.
        assert_eq!(payload.chart.data.len(), 2);
        assert_eq!(payload.chart.data[1], json!({"year": 2020, "B": 2}));
    }

    #[test]
    fn oversized_table_is_truncated_to_ten_rows() {
        let rows: Vec<Value> = (0..15).map(|i| json!({"n": i})).collect();
        let raw = json!({
            "summary": "s",
            "chart": {"type": "bar", "data": []},
            "table": rows,
        })
        .to_string();
        let payload = normalize(&raw, &[], ChartType::Bar).into_payload();
        assert_eq!(payload.table.len(), MAX_TABLE_ROWS);
    }

    #[test]
    fn non_object_chart_becomes_error_payload() {
        let raw = r#"{"summary":"s","chart":"oops","table":[{"a":1}]}"#;
        let outcome = normalize(raw, &context(), ChartType::Bar);
        let NormalizeOutcome::Fallback(payload) = outcome else {
            panic!("expected fallback");
        };
        assert!(payload.summary.contains("not a JSON object"));
        assert_eq!(payload.table.len(), 2);
    }

    #[test]
    fn fence_stripping_handles_plain_text() {
        assert_eq!(strip_code_fences("  hello  "), "hello");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }
}
