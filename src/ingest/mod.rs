//! CSV ingestion: parse, validate, template into text chunks, and replace
//! the vector index contents.
//!
//! Ingestion is replace-all: the collection is dropped and recreated, then
//! every row is embedded and upserted. There is no incremental update, and
//! a query issued mid-replace may observe a partially populated index; the
//! upload endpoint is expected to be called rarely and exclusively.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::errors::PipelineError;
use crate::embedding::Embedder;
use crate::index::{Record, VectorIndex};

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["final location", "year"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file is empty")]
    EmptyFile,
    #[error("missing required columns: {missing:?}")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
        total_columns: usize,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(String),
    #[error("failed to parse Excel file: {0}")]
    Excel(String),
    #[error("Please upload a CSV or Excel file (.csv, .xlsx, .xls)")]
    UnsupportedFormat,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub rows_processed: usize,
    pub columns: Vec<String>,
}

/// Route an upload to the parser matching its file extension. A missing
/// filename is treated as CSV.
pub fn parse_upload(filename: Option<&str>, bytes: &[u8]) -> Result<Vec<Record>, IngestError> {
    let lowered = filename.unwrap_or("upload.csv").to_lowercase();
    if lowered.ends_with(".xlsx") || lowered.ends_with(".xls") {
        parse_excel(bytes)
    } else if lowered.ends_with(".csv") {
        parse_csv(bytes)
    } else {
        Err(IngestError::UnsupportedFormat)
    }
}

/// Parse CSV bytes into records. Column names are trimmed; empty cells become
/// null; numeric-looking cells become numbers. Files that are not valid
/// UTF-8 are decoded as latin-1, so no row is dropped on encoding grounds.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>, IngestError> {
    let text: std::borrow::Cow<'_, str> = match std::str::from_utf8(bytes) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        // latin-1: every byte maps to the code point of the same value.
        Err(_) => std::borrow::Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_required_columns(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        // Skip unparseable lines, as the reference ingestion did.
        let Ok(row) = result else {
            continue;
        };
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            record.insert(header.clone(), parse_cell(cell));
        }
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(IngestError::EmptyFile);
    }
    Ok(rows)
}

/// Parse an Excel workbook: first sheet, first row as headers.
pub fn parse_excel(bytes: &[u8]) -> Result<Vec<Record>, IngestError> {
    use calamine::Reader;

    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| IngestError::Excel(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Excel("workbook has no sheets".to_string()))?
        .map_err(|e| IngestError::Excel(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .ok_or(IngestError::EmptyFile)?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();
    check_required_columns(&headers)?;

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(sheet_row.iter()) {
            record.insert(header.clone(), excel_cell(cell));
        }
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(IngestError::EmptyFile);
    }
    Ok(rows)
}

fn check_required_columns(headers: &[String]) -> Result<(), IngestError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns {
            missing,
            found: headers.iter().take(10).cloned().collect(),
            total_columns: headers.len(),
        })
    }
}

fn excel_cell(cell: &calamine::Data) -> Value {
    use calamine::Data;

    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::from(*i),
        // Whole-number floats (how spreadsheets store years and counts)
        // come back as integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::from(*f as i64)
        }
        Data::Float(f) => Value::from(*f),
        Data::Bool(b) => Value::from(*b),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        other => Value::String(other.to_string()),
    }
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return Value::from(float);
    }
    Value::String(trimmed.to_string())
}

/// Deterministic row-to-text template; this is what gets embedded.
pub fn row_chunk(record: &Record) -> String {
    let f = |key: &str| field(record, key);
    format!(
        "Location: {}\n\
         Year: {}\n\
         City: {}\n\
         Coordinates: ({}, {})\n\
         \n\
         Sales Metrics:\n\
         - Total Sales (IGR): {}\n\
         - Total Sold (IGR): {}\n\
         \n\
         Property Types Sold:\n\
         - Flats Sold: {}\n\
         - Office Sold: {}\n\
         - Shops Sold: {}\n\
         - Others Sold: {}\n\
         - Commercial Sold: {}\n\
         - Residential Sold: {}\n\
         \n\
         Weighted Average Rates:\n\
         - Flat Rate: {}\n\
         - Office Rate: {}\n\
         - Others Rate: {}\n\
         - Shop Rate: {}\n\
         \n\
         Prevailing Rate Ranges:\n\
         - Flat Range: {}\n\
         - Office Range: {}\n\
         - Others Range: {}\n\
         - Shop Range: {}\n\
         \n\
         Supply Metrics:\n\
         - Total Units: {}\n\
         - Total Carpet Area (sqft): {}\n\
         - Flat Total: {}\n\
         - Shop Total: {}\n\
         - Office Total: {}\n\
         - Others Total: {}\n",
        f("final location"),
        f("year"),
        f("city"),
        f("loc_lat"),
        f("loc_lng"),
        f("total_sales - igr"),
        f("total sold - igr"),
        f("flat_sold - igr"),
        f("office_sold - igr"),
        f("shop_sold - igr"),
        f("others_sold - igr"),
        f("commercial_sold - igr"),
        f("residential_sold - igr"),
        f("flat - weighted average rate"),
        f("office - weighted average rate"),
        f("others - weighted average rate"),
        f("shop - weighted average rate"),
        f("flat - most prevailing rate - range"),
        f("office - most prevailing rate - range"),
        f("others - most prevailing rate - range"),
        f("shop - most prevailing rate - range"),
        f("total units"),
        f("total carpet area supplied (sqft)"),
        f("flat total"),
        f("shop total"),
        f("office total"),
        f("others total"),
    )
}

fn field(record: &Record, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Drop and rebuild the index from the given rows.
pub async fn replace_all(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    rows: Vec<Record>,
) -> Result<IngestSummary, IngestError> {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    index.recreate().await?;

    let mut points = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let vector = embedder.embed(&row_chunk(&row)).await?;
        points.push((i as u64, vector, row));
    }

    let rows_processed = points.len();
    index.upsert_batch(points).await?;
    tracing::info!("Ingested {} rows into the index", rows_processed);

    Ok(IngestSummary {
        rows_processed,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::testing::InMemoryIndex;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, PipelineError> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    const CSV: &str = "final location , year,flat - weighted average rate\n\
                       Wakad,2021,5650\n\
                       Aundh,2022,\n";

    #[test]
    fn parses_rows_and_trims_headers() {
        let rows = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["final location"], json!("Wakad"));
        assert_eq!(rows[0]["year"], json!(2021));
        assert_eq!(rows[0]["flat - weighted average rate"], json!(5650));
        // Empty cell becomes null.
        assert!(rows[1]["flat - weighted average rate"].is_null());
    }

    #[test]
    fn rejects_missing_required_columns() {
        let err = parse_csv(b"city,rate\nPune,5650\n").unwrap_err();
        let IngestError::MissingColumns { missing, .. } = err else {
            panic!("expected missing-columns error");
        };
        assert_eq!(missing, vec!["final location", "year"]);
    }

    #[test]
    fn rejects_header_only_file() {
        let err = parse_csv(b"final location,year\n").unwrap_err();
        assert!(matches!(err, IngestError::EmptyFile));
    }

    #[test]
    fn chunk_includes_values_and_na_placeholders() {
        let rows = parse_csv(CSV.as_bytes()).unwrap();
        let chunk = row_chunk(&rows[0]);
        assert!(chunk.contains("Location: Wakad"));
        assert!(chunk.contains("Year: 2021"));
        assert!(chunk.contains("- Flat Rate: 5650"));
        assert!(chunk.contains("City: N/A"));
    }

    #[test]
    fn latin1_rows_are_decoded_not_dropped() {
        let bytes = b"final location,year\nCaf\xE9,2021\nWakad,2021\n";
        let rows = parse_csv(bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["final location"], json!("Café"));
        assert_eq!(rows[1]["final location"], json!("Wakad"));
    }

    #[test]
    fn file_with_only_latin1_rows_is_not_reported_empty() {
        let bytes = b"final location,year\nCaf\xE9,2021\n";
        let rows = parse_csv(bytes).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn unsupported_extension_is_rejected_with_a_clear_message() {
        let err = parse_upload(Some("data.txt"), b"whatever").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat));
        assert!(err.to_string().contains("CSV or Excel"));
    }

    #[test]
    fn uploads_route_by_extension() {
        assert!(parse_upload(Some("data.csv"), CSV.as_bytes()).is_ok());
        assert!(parse_upload(Some("DATA.CSV"), CSV.as_bytes()).is_ok());
        // A missing filename is treated as CSV.
        assert!(parse_upload(None, CSV.as_bytes()).is_ok());
        // Bytes that are not a workbook fail in the Excel parser, not as a
        // misleading missing-columns CSV error.
        let err = parse_upload(Some("data.xlsx"), b"not a workbook").unwrap_err();
        assert!(matches!(err, IngestError::Excel(_)));
    }

    #[test]
    fn excel_cells_normalize_like_csv_cells() {
        use calamine::Data;

        assert_eq!(excel_cell(&Data::Empty), Value::Null);
        assert_eq!(excel_cell(&Data::String("  ".to_string())), Value::Null);
        assert_eq!(excel_cell(&Data::String(" Wakad ".to_string())), json!("Wakad"));
        // Spreadsheets store years as whole-number floats.
        assert_eq!(excel_cell(&Data::Float(2021.0)), json!(2021));
        assert_eq!(excel_cell(&Data::Float(0.5)), json!(0.5));
        assert_eq!(excel_cell(&Data::Int(430)), json!(430));
    }

    #[test]
    fn parses_file_uploaded_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let bytes = std::fs::read(file.path()).unwrap();

        let rows = parse_csv(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn replace_all_rebuilds_the_index() {
        let index = InMemoryIndex::new();
        let rows = parse_csv(CSV.as_bytes()).unwrap();

        let summary = replace_all(&index, &FixedEmbedder, rows).await.unwrap();
        assert_eq!(summary.rows_processed, 2);
        assert!(summary.columns.contains(&"final location".to_string()));
        assert!(index.exists().await.unwrap());
        assert_eq!(index.count().await.unwrap(), 2);

        // A second upload replaces, not appends.
        let rows = parse_csv("final location,year\nBaner,2023\n".as_bytes()).unwrap();
        let summary = replace_all(&index, &FixedEmbedder, rows).await.unwrap();
        assert_eq!(summary.rows_processed, 1);
        assert_eq!(index.count().await.unwrap(), 1);
    }
}
