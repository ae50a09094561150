//! Chart-data restructuring.
//!
//! When the model falls back to the legacy `{"label": "Wakad 2021",
//! "metric": 5000}` row shape, this pure algorithm re-derives a proper
//! tabular structure from the retrieved records: one row per year, one
//! column per location. Repair is best-effort; when nothing resolves it
//! returns the input unchanged rather than destroying the only available
//! data.

use serde_json::Value;

use crate::index::Record;

pub fn restructure_chart_data(data: &[Value], context: &[Record]) -> Vec<Value> {
    // Ordered by first appearance; last write wins per (year, location).
    let mut grouped: Vec<(Value, Record)> = Vec::new();

    for row in data {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let Some(label) = obj.get("label").and_then(|v| v.as_str()) else {
            continue;
        };

        let mut tokens = label.split_whitespace();
        let Some(location) = tokens.next() else {
            continue;
        };
        if tokens.next().is_none() {
            // A bare label carries no (location, year) pair to resolve.
            continue;
        }

        let Some(year) = lookup_year(context, location) else {
            continue;
        };
        let metric = obj.get("metric").cloned().unwrap_or(Value::Null);

        match grouped.iter_mut().find(|(y, _)| *y == year) {
            Some((_, locations)) => {
                locations.insert(location.to_string(), metric);
            }
            None => {
                let mut locations = Record::new();
                locations.insert(location.to_string(), metric);
                grouped.push((year, locations));
            }
        }
    }

    if grouped.is_empty() {
        return data.to_vec();
    }

    grouped.sort_by(|(a, _), (b, _)| compare_years(a, b));

    grouped
        .into_iter()
        .map(|(year, locations)| {
            let mut row = Record::new();
            row.insert("year".to_string(), year);
            for (location, metric) in locations {
                row.insert(location, metric);
            }
            Value::Object(row)
        })
        .collect()
}

/// First context record whose `final location` case-insensitively equals the
/// token supplies the year. First match wins; retrieval order is preserved.
fn lookup_year(context: &[Record], location: &str) -> Option<Value> {
    let wanted = location.to_lowercase();
    let record = context.iter().find(|record| {
        record
            .get("final location")
            .and_then(|v| v.as_str())
            .map(|loc| loc.to_lowercase() == wanted)
            .unwrap_or(false)
    })?;
    record.get("year").cloned().filter(|year| !year.is_null())
}

fn compare_years(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
