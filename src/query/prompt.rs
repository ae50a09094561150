//! Prompt construction.
//!
//! The enumerated rules below are the contract the normalizer checks
//! mechanically; the two must stay in lock-step.

use serde_json::Value;

use super::types::{ChartType, IntentSignals};
use crate::index::Record;

/// Records beyond this bound are dropped before formatting to bound the
/// prompt size.
pub const MAX_CONTEXT_RECORDS: usize = 15;

pub fn build_prompt(
    query: &str,
    signals: &IntentSignals,
    recommended: ChartType,
    records: &[Record],
) -> String {
    let context_text = format_records(&records[..records.len().min(MAX_CONTEXT_RECORDS)]);

    format!(
        r#"You are a real estate data analyst. Based on the retrieved data, generate a structured JSON response.

Available Data:
{context_text}

User Query: {query}

Query intent: comparison={is_comparison}, trend={is_trend}, total={has_total}. Recommended chart type: "{chart_type}".

Analyze the data and return ONLY valid JSON with this exact structure:
{example}

Rules:
1. "chart.type" must be exactly "bar" or "line" - no other value is valid.
2. For a "line" chart, every data row must have a first key naming the time/category dimension (e.g. "year") and all remaining keys must be numeric metrics. Do NOT use generic "label"/"metric" key pairs, nested objects, or numbers encoded as strings.
3. For a "bar" chart, every data row must have a first key naming the category dimension (e.g. "location") and all remaining keys must be numeric metrics.
4. All rows within "chart.data" must share an identical key set.
5. "table" must contain 5-10 rows with the most relevant columns from the data.
6. "summary" must be 2-3 sentences answering the question with specific figures from the data.

Return ONLY the JSON object, no explanation."#,
        context_text = context_text,
        query = query,
        is_comparison = signals.is_comparison,
        is_trend = signals.is_trend,
        has_total = signals.has_total,
        chart_type = recommended.as_str(),
        example = worked_example(recommended),
    )
}

/// Render records as `Record N:` blocks of `key: value` lines, omitting
/// null-valued keys.
fn format_records(records: &[Record]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let lines: Vec<String> = record
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| format!("  {}: {}", k, render_scalar(v)))
                .collect();
            format!("Record {}:\n{}", i + 1, lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Worked example of the expected JSON shape for the recommended chart type.
fn worked_example(chart_type: ChartType) -> &'static str {
    match chart_type {
        ChartType::Line => {
            r#"{
  "summary": "A concise 2-3 sentence analysis answering the user's question with specific numbers and insights",
  "chart": {
    "type": "line",
    "data": [
      {"year": 2020, "Wakad": 5200, "Aundh": 6100},
      {"year": 2021, "Wakad": 5650, "Aundh": 6400}
    ]
  },
  "table": [
    {"Location": "Wakad", "Year": 2020, "Flat Rate": 5200, "Units Sold": 410},
    ...
  ]
}"#
        }
        ChartType::Bar => {
            r#"{
  "summary": "A concise 2-3 sentence analysis answering the user's question with specific numbers and insights",
  "chart": {
    "type": "bar",
    "data": [
      {"location": "Wakad", "total_sales": 125000},
      {"location": "Aundh", "total_sales": 98000}
    ]
  },
  "table": [
    {"Location": "Wakad", "Year": 2021, "Total Sales": 125000, "Units Sold": 430},
    ...
  ]
}"#
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::classifier::classify;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn prompt_contains_query_signals_and_rules() {
        let query = "compare Wakad vs Aundh";
        let signals = classify(query);
        let recommended = signals.recommended_chart();
        let records = vec![record(&[
            ("final location", json!("Wakad")),
            ("year", json!(2021)),
        ])];

        let prompt = build_prompt(query, &signals, recommended, &records);
        assert!(prompt.contains("User Query: compare Wakad vs Aundh"));
        assert!(prompt.contains("comparison=true"));
        assert!(prompt.contains(r#"Recommended chart type: "bar""#));
        assert!(prompt.contains(r#""type": "bar""#));
        assert!(prompt.contains("must share an identical key set"));
        assert!(prompt.contains("Record 1:"));
        assert!(prompt.contains("final location: Wakad"));
    }

    #[test]
    fn null_values_are_omitted() {
        let records = vec![record(&[
            ("final location", json!("Wakad")),
            ("city", Value::Null),
        ])];
        let formatted = format_records(&records);
        assert!(formatted.contains("final location: Wakad"));
        assert!(!formatted.contains("city"));
    }

    #[test]
    fn context_is_truncated_to_fifteen_records() {
        let records: Vec<Record> = (0..30)
            .map(|i| record(&[("year", json!(2000 + i))]))
            .collect();
        let signals = classify("flat rates");
        let prompt = build_prompt("flat rates", &signals, ChartType::Line, &records);
        assert!(prompt.contains("Record 15:"));
        assert!(!prompt.contains("Record 16:"));
    }
}
