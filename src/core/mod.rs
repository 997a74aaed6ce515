//! Core data types shared across the pipeline.
//!
//! A [`Dataset`] is the in-memory tabular structure produced by ingestion,
//! mutated by cleaning, and consumed read-only by aggregation and the report
//! writers. Everything here is plain data; the stage logic lives in the
//! `ingest`, `cleaning`, `kpis` and `report` modules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value after type coercion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Rendering used by the cleaned-CSV exporter and duplicate detection.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Short type name used by the data-quality profile.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Date(_) => "date",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Ordered columns plus ordered rows. Invariant: every row has exactly
/// `columns.len()` cells; `push_row` pads or truncates to enforce it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Cell lookup by column name; `Value::Null` for unknown columns.
    pub fn cell(&self, row: usize, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        match self.column_index(column) {
            Some(idx) => self.rows.get(row).map_or(&NULL, |r| &r[idx]),
            None => &NULL,
        }
    }

    /// All values of one column, row order preserved. Empty if the column
    /// does not exist.
    pub fn column_values<'a>(&'a self, name: &str) -> Vec<&'a Value> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().map(|r| &r[idx]).collect(),
            None => Vec::new(),
        }
    }
}

/// Defect kind recorded by the cleaner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    MissingValue,
    TypeMismatch,
    UnparseableDate,
    DuplicateRow,
    MissingColumn,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::MissingValue => "missing value",
            IssueKind::TypeMismatch => "type mismatch",
            IssueKind::UnparseableDate => "unparseable date",
            IssueKind::DuplicateRow => "duplicate row",
            IssueKind::MissingColumn => "missing column",
        };
        f.write_str(s)
    }
}

/// One defect found during cleaning. `row` indexes the ingested dataset
/// (before any rows were dropped); `dropped_row` marks issues that removed
/// the row from aggregation, which is what the conservation check counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub row: usize,
    pub column: String,
    pub kind: IssueKind,
    pub detail: String,
    pub dropped_row: bool,
}

/// Overall totals across the cleaned dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub revenue: f64,
    pub cost: f64,
    pub gross_profit: f64,
    /// `gross_profit / revenue`; absent when revenue sums to zero.
    pub margin: Option<f64>,
    pub units: f64,
    pub rows_loaded: usize,
}

/// Per-month totals, sorted ascending by month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    pub month: NaiveDate,
    pub revenue: f64,
    pub cost: f64,
    pub gross_profit: f64,
    pub units: f64,
    pub margin: Option<f64>,
}

/// Month-over-month deltas for one month. Absolute and percent deltas are
/// absent on the first month or when the previous value is unusable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarianceRow {
    pub month: NaiveDate,
    pub revenue: f64,
    pub cost: f64,
    pub gross_profit: f64,
    pub units: f64,
    pub margin: Option<f64>,
    pub revenue_mom_abs: Option<f64>,
    pub revenue_mom_pct: Option<f64>,
    pub cost_mom_abs: Option<f64>,
    pub cost_mom_pct: Option<f64>,
    pub gross_profit_mom_abs: Option<f64>,
    pub gross_profit_mom_pct: Option<f64>,
    pub units_mom_abs: Option<f64>,
    pub units_mom_pct: Option<f64>,
    pub margin_mom_abs: Option<f64>,
    pub margin_mom_pct: Option<f64>,
}

/// Month x dimension drilldown (region or product).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillRow {
    pub month: NaiveDate,
    pub key: String,
    pub revenue: f64,
    pub gross_profit: f64,
}

/// Every report derives its numbers from one instance of this, so totals in
/// the Excel pack, the PDF and the CSV-derived views always agree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiTables {
    pub summary: Summary,
    pub trends: Vec<TrendRow>,
    pub variance: Vec<VarianceRow>,
    pub by_region: Vec<DrillRow>,
    pub by_product: Vec<DrillRow>,
}

/// Headline numbers shared by the Excel executive sheet and the PDF.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecInsights {
    pub latest_month: Option<NaiveDate>,
    pub rows_loaded: usize,
    pub revenue_mom_pct: Option<f64>,
    pub margin_mom_abs: Option<f64>,
    pub top_region: Option<(String, f64)>,
    pub top_product: Option<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_row_pads_and_truncates_to_column_width() {
        let mut ds = Dataset::new(vec!["a".into(), "b".into()]);
        ds.push_row(vec![Value::Number(1.0)]);
        ds.push_row(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
        ]);
        assert_eq!(ds.rows[0], vec![Value::Number(1.0), Value::Null]);
        assert_eq!(ds.rows[1].len(), 2);
    }

    #[test]
    fn cell_lookup_handles_unknown_columns() {
        let mut ds = Dataset::new(vec!["a".into()]);
        ds.push_row(vec![Value::Text("x".into())]);
        assert_eq!(ds.cell(0, "a"), &Value::Text("x".into()));
        assert!(ds.cell(0, "nope").is_null());
    }

    #[test]
    fn render_formats_whole_numbers_without_decimals() {
        assert_eq!(Value::Number(5.0).render(), "5");
        assert_eq!(Value::Number(5.25).render(), "5.25");
        assert_eq!(Value::Null.render(), "");
    }
}
