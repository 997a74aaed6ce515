//! Data ingestion: discover input dumps and stack them into one [`Dataset`].
//!
//! Ingestion is deliberately strict — an unreadable file or an empty input
//! directory aborts the run, since every downstream table depends on the
//! complete dataset. Type coercion is *not* done here; CSV cells arrive as
//! raw text and spreadsheet cells keep whatever type the workbook stored,
//! and the cleaner normalizes both.

pub mod csv;
pub mod excel;

use log::info;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::{Dataset, Value};
use crate::errors::PipelineError;

/// Lineage column appended to every ingested file.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Recursively list supported input files, sorted for deterministic runs.
pub fn discover_inputs(input_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Read every input dump under `input_dir` into one dataset.
///
/// Each file contributes a `source_file` lineage column; files with
/// different headers are stacked onto the union of columns, missing cells
/// filled with `Null`.
pub fn read_all(input_dir: &Path) -> Result<Dataset, PipelineError> {
    let files = discover_inputs(input_dir);
    if files.is_empty() {
        return Err(PipelineError::ingest("no input files found", input_dir));
    }

    let mut parts = Vec::with_capacity(files.len());
    for path in &files {
        let mut part = read_one(path)?;
        attach_source_file(&mut part, path);
        info!("ingested {} rows from {}", part.len(), path.display());
        parts.push(part);
    }
    Ok(stack(parts))
}

fn read_one(path: &Path) -> Result<Dataset, PipelineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => csv::read_csv(path),
        "xlsx" | "xls" => excel::read_excel(path),
        other => Err(PipelineError::ingest(
            format!("unsupported input format: .{other}"),
            path,
        )),
    }
}

fn attach_source_file(dataset: &mut Dataset, path: &Path) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    dataset.columns.push(SOURCE_FILE_COLUMN.to_string());
    for row in &mut dataset.rows {
        row.push(Value::Text(name.clone()));
    }
}

/// Stack datasets onto the union of their columns, first-seen order.
fn stack(parts: Vec<Dataset>) -> Dataset {
    let mut columns: Vec<String> = Vec::new();
    for part in &parts {
        for col in &part.columns {
            if !columns.contains(col) {
                columns.push(col.clone());
            }
        }
    }

    let mut combined = Dataset::new(columns);
    for part in parts {
        let mapping: Vec<Option<usize>> = combined
            .columns
            .iter()
            .map(|col| part.column_index(col))
            .collect();
        for row in part.rows {
            let cells = mapping
                .iter()
                .map(|idx| idx.map_or(Value::Null, |i| row[i].clone()))
                .collect();
            combined.push_row(cells);
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_unions_columns_and_pads_missing_cells() {
        let mut a = Dataset::new(vec!["date".into(), "revenue".into()]);
        a.push_row(vec![Value::Text("2025-01-01".into()), Value::Number(10.0)]);
        let mut b = Dataset::new(vec!["revenue".into(), "region".into()]);
        b.push_row(vec![Value::Number(20.0), Value::Text("VIC".into())]);

        let combined = stack(vec![a, b]);
        assert_eq!(combined.columns, vec!["date", "revenue", "region"]);
        assert_eq!(combined.len(), 2);
        assert!(combined.cell(1, "date").is_null());
        assert_eq!(combined.cell(1, "region"), &Value::Text("VIC".into()));
    }

    #[test]
    fn discover_ignores_unsupported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x\n1\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "ignored").unwrap();
        let found = discover_inputs(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.csv"));
    }

    #[test]
    fn empty_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_all(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no input files"));
    }
}
