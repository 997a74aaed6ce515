//! XLSX/XLS ingestion via calamine.
//!
//! Reads the first worksheet, first row as header. Datetime cells are kept
//! as dates; booleans are downgraded to text since no canonical column is
//! boolean-typed.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::cleaning::excel_serial_to_date;
use crate::core::{Dataset, Value};
use crate::errors::PipelineError;

pub fn read_excel(path: &Path) -> Result<Dataset, PipelineError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PipelineError::ingest(format!("cannot open workbook: {e}"), path))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::ingest("workbook has no worksheets", path))?
        .map_err(|e| PipelineError::ingest(format!("cannot read worksheet: {e}"), path))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_to_value(cell).render())
            .collect::<Vec<_>>(),
        None => return Ok(Dataset::empty()),
    };

    let mut dataset = Dataset::new(headers);
    for row in rows {
        let cells = row.iter().map(cell_to_value).collect::<Vec<_>>();
        // Fully blank trailing rows are common in hand-edited sheets.
        if cells.iter().all(Value::is_null) {
            continue;
        }
        dataset.push_row(cells);
    }
    Ok(dataset)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                Value::Null
            } else {
                Value::Text(s.clone())
            }
        }
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => Value::Date(date),
            None => Value::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(format!("#ERR:{e:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn reads_first_sheet_with_header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "date").unwrap();
        sheet.write_string(0, 1, "revenue").unwrap();
        sheet.write_string(1, 0, "2025-02-01").unwrap();
        sheet.write_number(1, 1, 120.5).unwrap();
        workbook.save(&path).unwrap();

        let ds = read_excel(&path).unwrap();
        assert_eq!(ds.columns, vec!["date", "revenue"]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.cell(0, "revenue"), &Value::Number(120.5));
    }

    #[test]
    fn unreadable_workbook_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(read_excel(&path).is_err());
    }
}
