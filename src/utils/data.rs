//! Dataset ingest and serialization
//!
//! The pipeline ingests delimited tabular text with every column read as
//! string, so that sentinel normalization and numeric coercion see the raw
//! cell representation before any typing happens.

use crate::error::{CleanError, Result};
use polars::prelude::*;
use std::io::Cursor;

/// Parse a byte stream as header-plus-rows CSV, all columns as strings.
///
/// Fails with a [`CleanError::DataFormat`] on empty or unparseable input.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CleanError::DataFormat("input is empty".to_string()));
    }

    // infer_schema_length of 0 keeps every column as String; typing is the
    // coercer's job, not the reader's.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| CleanError::DataFormat(format!("not parseable as tabular text: {e}")))?;

    if df.height() == 0 {
        return Err(CleanError::DataFormat("no data rows".to_string()));
    }
    if df.width() == 0 {
        return Err(CleanError::DataFormat("no columns".to_string()));
    }

    Ok(df)
}

/// Read a CSV file from disk (CLI path).
pub fn read_csv_path(path: impl AsRef<std::path::Path>) -> Result<DataFrame> {
    let bytes = std::fs::read(path)?;
    read_csv_bytes(&bytes)
}

/// Serialize a frame back to delimited tabular text with a header row.
pub fn write_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(df)
        .map_err(|e| CleanError::Serialization(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| CleanError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_bytes_all_strings() {
        let df = read_csv_bytes(b"a,b\n1,x\n2,y\n").unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
        // Even the numeric-looking column stays String
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_read_empty_input_fails() {
        let err = read_csv_bytes(b"").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_read_header_only_fails() {
        let err = read_csv_bytes(b"a,b\n").unwrap_err();
        assert!(matches!(err, CleanError::DataFormat(_)));
    }

    #[test]
    fn test_write_round_trip() {
        let mut df = read_csv_bytes(b"a,b\n1,x\n2,y\n").unwrap();
        let csv = write_csv_string(&mut df).unwrap();
        assert!(csv.starts_with("a,b"));
        let reread = read_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(reread.height(), 2);
    }
}
