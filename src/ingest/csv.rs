//! CSV ingestion.
//!
//! Files are read as bytes and decoded with a lossy UTF-8 fallback, so
//! latin-1 exports from older tools still load instead of aborting the run.

use std::io::Cursor;
use std::path::Path;

use crate::core::{Dataset, Value};
use crate::errors::PipelineError;

pub fn read_csv(path: &Path) -> Result<Dataset, PipelineError> {
    let bytes = std::fs::read(path)
        .map_err(|e| PipelineError::ingest(format!("cannot read file: {e}"), path))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .trim(::csv::Trim::None)
        .from_reader(Cursor::new(text));

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::ingest(format!("cannot read CSV header: {e}"), path))?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut dataset = Dataset::new(headers);
    for record in reader.records() {
        let record =
            record.map_err(|e| PipelineError::ingest(format!("malformed CSV row: {e}"), path))?;
        let cells = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::Text(field.to_string())
                }
            })
            .collect();
        dataset.push_row(cells);
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &[u8]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("in.csv"), content).unwrap();
        dir
    }

    #[test]
    fn reads_headers_and_rows() {
        let dir = write_temp(b"date,revenue\n2025-01-01,100\n2025-01-02,50\n");
        let ds = read_csv(&dir.path().join("in.csv")).unwrap();
        assert_eq!(ds.columns, vec!["date", "revenue"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, "revenue"), &Value::Text("100".into()));
    }

    #[test]
    fn empty_fields_become_null() {
        let dir = write_temp(b"a,b\n1,\n");
        let ds = read_csv(&dir.path().join("in.csv")).unwrap();
        assert!(ds.cell(0, "b").is_null());
    }

    #[test]
    fn short_rows_are_padded() {
        let dir = write_temp(b"a,b,c\n1,2\n");
        let ds = read_csv(&dir.path().join("in.csv")).unwrap();
        assert!(ds.cell(0, "c").is_null());
    }

    #[test]
    fn non_utf8_bytes_fall_back_to_lossy_decoding() {
        // "caf\xe9" in latin-1
        let dir = write_temp(b"name\ncaf\xe9\n");
        let ds = read_csv(&dir.path().join("in.csv")).unwrap();
        assert_eq!(ds.len(), 1);
        let text = ds.cell(0, "name").as_text().unwrap().to_string();
        assert!(text.starts_with("caf"));
    }
}
