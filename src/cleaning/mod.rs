//! Cleaning and validation of the ingested dataset.
//!
//! Applies the configured rules in a fixed order: header standardization,
//! alias mapping (with first-non-null merge when aliasing collapses two
//! source columns into one), type coercion, validation warnings, then
//! row-level policy (required values, whole-row duplicates).
//!
//! Cleaning never fails fatally. Anything unrecoverable at row level is
//! downgraded to a [`QualityIssue`] and the row is excluded from
//! aggregation; the run continues.

use chrono::{Days, NaiveDate, NaiveDateTime};
use log::warn;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use crate::core::{Dataset, IssueKind, QualityIssue, Value};

/// Canonical columns every downstream table is keyed on.
pub const CANON_DATE: &str = "date";
pub const CANON_REVENUE: &str = "revenue";
pub const CANON_COST: &str = "cost";
pub const CANON_UNITS: &str = "units";
pub const CANON_REGION: &str = "region";
pub const CANON_PRODUCT: &str = "product";

/// Minimal column set needed to build a usable report.
pub const REQUIRED_COLUMNS: [&str; 2] = [CANON_DATE, CANON_REVENUE];

const NULL_MARKERS: [&str; 5] = ["", "nan", "none", "null", "n/a"];

/// Excel serial day numbers in this window (~1954..=2064) are treated as
/// dates when they show up in a date column.
const EXCEL_SERIAL_MIN: f64 = 20000.0;
const EXCEL_SERIAL_MAX: f64 = 60000.0;

/// Result of a cleaning pass. The conservation invariant holds:
/// `dataset.len()` plus the number of issues with `dropped_row` equals
/// `ingested_rows`.
#[derive(Clone, Debug)]
pub struct CleanOutcome {
    pub dataset: Dataset,
    pub issues: Vec<QualityIssue>,
    pub warnings: Vec<String>,
    pub ingested_rows: usize,
}

impl CleanOutcome {
    pub fn dropped_rows(&self) -> usize {
        self.issues.iter().filter(|i| i.dropped_row).count()
    }
}

/// Normalize a header: trim, punctuation runs to `_`, lowercase.
pub fn snake_name(raw: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let re = NON_WORD.get_or_init(|| Regex::new(r"[^\w]+").expect("static regex"));
    re.replace_all(raw.trim(), "_")
        .to_lowercase()
        .trim_matches('_')
        .to_string()
}

/// Built-in header aliases mapping common dump headers onto the canon.
pub fn default_aliases() -> BTreeMap<String, String> {
    let pairs = [
        // date
        ("date", CANON_DATE),
        ("month", CANON_DATE),
        ("period", CANON_DATE),
        ("transaction_date", CANON_DATE),
        ("order_date", CANON_DATE),
        // revenue
        ("revenue", CANON_REVENUE),
        ("sales", CANON_REVENUE),
        ("total_sales", CANON_REVENUE),
        ("amount", CANON_REVENUE),
        ("net_sales", CANON_REVENUE),
        // cost
        ("cost", CANON_COST),
        ("cogs", CANON_COST),
        ("total_cost", CANON_COST),
        // units
        ("units", CANON_UNITS),
        ("qty", CANON_UNITS),
        ("quantity", CANON_UNITS),
        // dimensions
        ("region", CANON_REGION),
        ("state", CANON_REGION),
        ("product", CANON_PRODUCT),
        ("sku", CANON_PRODUCT),
        ("category", CANON_PRODUCT),
    ];
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Convert an Excel serial day number (origin 1899-12-30) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|origin| origin.checked_add_days(Days::new(serial.trunc() as u64)))
}

/// Parse a date from the formats that show up in real dumps.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    const DATE_FORMATS: [&str; 6] = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Tolerant numeric parse: strips currency symbols, thousands separators
/// and surrounding whitespace.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Run the full cleaning pass over an ingested dataset.
pub fn clean(
    raw: &Dataset,
    aliases: &BTreeMap<String, String>,
    drop_duplicates: bool,
) -> CleanOutcome {
    let ingested_rows = raw.len();
    let standardized = standardize_headers(raw);
    let aliased = apply_aliases(&standardized, aliases);
    let (coerced, mut issues, revenue_issue_by_row) = coerce_types(&aliased);
    let mut warnings = validate(&coerced, &mut issues);

    let dataset = apply_row_policy(
        coerced,
        &mut issues,
        revenue_issue_by_row,
        drop_duplicates,
    );

    let dropped = issues.iter().filter(|i| i.dropped_row).count();
    if dropped > 0 {
        warnings.push(format!("Rows excluded from aggregation: {dropped}"));
    }
    for w in &warnings {
        warn!("{w}");
    }

    CleanOutcome {
        dataset,
        issues,
        warnings,
        ingested_rows,
    }
}

fn standardize_headers(raw: &Dataset) -> Dataset {
    Dataset {
        columns: raw.columns.iter().map(|c| snake_name(c)).collect(),
        rows: raw.rows.clone(),
    }
}

/// Rename columns per the alias map. When two source columns land on the
/// same canonical name (e.g. `sales` and `revenue`), keep the first
/// non-null value left-to-right per row.
fn apply_aliases(ds: &Dataset, aliases: &BTreeMap<String, String>) -> Dataset {
    let renamed: Vec<String> = ds
        .columns
        .iter()
        .map(|c| aliases.get(c).cloned().unwrap_or_else(|| c.clone()))
        .collect();

    let mut out_columns: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, name) in renamed.iter().enumerate() {
        match out_columns.iter().position(|c| c == name) {
            Some(pos) => groups[pos].push(idx),
            None => {
                out_columns.push(name.clone());
                groups.push(vec![idx]);
            }
        }
    }

    let mut out = Dataset::new(out_columns);
    for row in &ds.rows {
        let cells = groups
            .iter()
            .map(|sources| {
                sources
                    .iter()
                    .map(|&i| &row[i])
                    .find(|v| !v.is_null())
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect();
        out.push_row(cells);
    }
    out
}

type RevenueIssueIndex = HashMap<usize, usize>;

/// Coerce each cell to its canonical type, recording non-fatal issues.
/// Returns the issue index per row for the revenue column so the row
/// policy can upgrade a type mismatch into a row drop without recording
/// the same cell twice.
fn coerce_types(ds: &Dataset) -> (Dataset, Vec<QualityIssue>, RevenueIssueIndex) {
    let mut issues = Vec::new();
    let mut revenue_issue_by_row = HashMap::new();
    let numeric_columns = [CANON_REVENUE, CANON_COST, CANON_UNITS];

    let mut out = Dataset::new(ds.columns.clone());
    for (row_idx, row) in ds.rows.iter().enumerate() {
        let cells = ds
            .columns
            .iter()
            .zip(row.iter())
            .map(|(col, value)| {
                if col == CANON_DATE {
                    coerce_date(row_idx, value, &mut issues)
                } else if numeric_columns.contains(&col.as_str()) {
                    coerce_number(row_idx, col, value, &mut issues, &mut revenue_issue_by_row)
                } else {
                    normalize_text(value)
                }
            })
            .collect();
        out.push_row(cells);
    }
    (out, issues, revenue_issue_by_row)
}

fn coerce_date(row: usize, value: &Value, issues: &mut Vec<QualityIssue>) -> Value {
    match value {
        Value::Date(d) => Value::Date(*d),
        Value::Null => Value::Null,
        Value::Number(n) => {
            if (EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(n) {
                match excel_serial_to_date(*n) {
                    Some(d) => Value::Date(d),
                    None => Value::Null,
                }
            } else {
                issues.push(QualityIssue {
                    row,
                    column: CANON_DATE.to_string(),
                    kind: IssueKind::UnparseableDate,
                    detail: format!("numeric value {n} is not a plausible date"),
                    dropped_row: false,
                });
                Value::Null
            }
        }
        Value::Text(s) => {
            let trimmed = s.trim();
            if is_null_marker(trimmed) {
                return Value::Null;
            }
            if let Some(d) = parse_date(trimmed) {
                return Value::Date(d);
            }
            // Excel serials sometimes arrive as text ("44927" or "44927.0").
            if let Some(n) = parse_number(trimmed) {
                if (EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&n) {
                    if let Some(d) = excel_serial_to_date(n) {
                        return Value::Date(d);
                    }
                }
            }
            issues.push(QualityIssue {
                row,
                column: CANON_DATE.to_string(),
                kind: IssueKind::UnparseableDate,
                detail: format!("cannot parse date from {trimmed:?}"),
                dropped_row: false,
            });
            Value::Null
        }
    }
}

fn coerce_number(
    row: usize,
    column: &str,
    value: &Value,
    issues: &mut Vec<QualityIssue>,
    revenue_issue_by_row: &mut RevenueIssueIndex,
) -> Value {
    match value {
        Value::Number(n) => Value::Number(*n),
        Value::Null => Value::Null,
        Value::Date(_) | Value::Text(_) => {
            let text = value.render();
            let trimmed = text.trim();
            if is_null_marker(trimmed) {
                return Value::Null;
            }
            if let (Value::Text(_), Some(n)) = (value, parse_number(trimmed)) {
                return Value::Number(n);
            }
            let issue_idx = issues.len();
            issues.push(QualityIssue {
                row,
                column: column.to_string(),
                kind: IssueKind::TypeMismatch,
                detail: format!("cannot parse number from {trimmed:?}"),
                dropped_row: false,
            });
            if column == CANON_REVENUE {
                revenue_issue_by_row.insert(row, issue_idx);
            }
            Value::Null
        }
    }
}

fn normalize_text(value: &Value) -> Value {
    match value {
        Value::Text(s) => {
            let trimmed = s.trim();
            if is_null_marker(trimmed) {
                Value::Null
            } else {
                Value::Text(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

fn is_null_marker(text: &str) -> bool {
    NULL_MARKERS.contains(&text.to_lowercase().as_str())
}

/// Dataset-level validation. Produces human-readable warnings and records
/// missing required columns as issues.
fn validate(ds: &Dataset, issues: &mut Vec<QualityIssue>) -> Vec<String> {
    let mut warnings = Vec::new();

    for required in REQUIRED_COLUMNS {
        match ds.column_index(required) {
            None => {
                warnings.push(format!("Missing required column: '{required}'"));
                issues.push(QualityIssue {
                    row: 0,
                    column: required.to_string(),
                    kind: IssueKind::MissingColumn,
                    detail: "required column absent from all inputs".to_string(),
                    dropped_row: false,
                });
            }
            Some(idx) => {
                if ds.is_empty() {
                    continue;
                }
                let missing = ds.rows.iter().filter(|r| r[idx].is_null()).count();
                if missing * 2 > ds.len() {
                    warnings.push(format!("Column '{required}' has >50% missing values"));
                }
            }
        }
    }

    if ds.has_column(CANON_DATE) {
        let bad = ds
            .column_values(CANON_DATE)
            .iter()
            .filter(|v| v.is_null())
            .count();
        if bad > 0 {
            warnings.push(format!("Rows with unparseable or missing dates: {bad}"));
        }
    }

    warnings
}

/// Row-level policy: exclude rows missing a required revenue value, then
/// handle whole-row duplicates.
fn apply_row_policy(
    ds: Dataset,
    issues: &mut Vec<QualityIssue>,
    revenue_issue_by_row: RevenueIssueIndex,
    drop_duplicates: bool,
) -> Dataset {
    let revenue_idx = ds.column_index(CANON_REVENUE);
    let mut seen: HashSet<String> = HashSet::new();

    let mut out = Dataset::new(ds.columns.clone());
    for (row_idx, row) in ds.rows.into_iter().enumerate() {
        if let Some(idx) = revenue_idx {
            if row[idx].is_null() {
                match revenue_issue_by_row.get(&row_idx) {
                    // The cell already has a type-mismatch issue; upgrade it
                    // to the row drop instead of recording the cell twice.
                    Some(&issue_idx) => issues[issue_idx].dropped_row = true,
                    None => issues.push(QualityIssue {
                        row: row_idx,
                        column: CANON_REVENUE.to_string(),
                        kind: IssueKind::MissingValue,
                        detail: "required revenue value missing; row excluded".to_string(),
                        dropped_row: true,
                    }),
                }
                continue;
            }
        }

        let signature = row
            .iter()
            .map(Value::render)
            .collect::<Vec<_>>()
            .join("\u{1f}");
        if !seen.insert(signature) {
            issues.push(QualityIssue {
                row: row_idx,
                column: String::new(),
                kind: IssueKind::DuplicateRow,
                detail: if drop_duplicates {
                    "identical to an earlier row; dropped".to_string()
                } else {
                    "identical to an earlier row; kept (flag-only mode)".to_string()
                },
                dropped_row: drop_duplicates,
            });
            if drop_duplicates {
                continue;
            }
        }

        out.push_row(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dataset(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
        let mut ds = Dataset::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            ds.push_row(row);
        }
        ds
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn snake_name_normalizes_messy_headers() {
        assert_eq!(snake_name(" State "), "state");
        assert_eq!(snake_name("Sales($)"), "sales");
        assert_eq!(snake_name("Transaction Date"), "transaction_date");
        assert_eq!(snake_name("a--b__c"), "a_b_c");
    }

    #[test]
    fn parse_date_handles_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(parse_date("2025-01-15"), Some(expected));
        assert_eq!(parse_date("15/01/2025"), Some(expected));
        assert_eq!(parse_date("2025-01-15 09:30:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn excel_serials_convert_with_lotus_origin() {
        // 45658 == 2025-01-01
        assert_eq!(
            excel_serial_to_date(45658.0),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
    }

    #[test]
    fn parse_number_strips_currency_noise() {
        assert_eq!(parse_number("$1,234.50"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn aliases_collapse_duplicate_columns_first_non_null() {
        let raw = dataset(
            &["sales", "revenue"],
            vec![
                vec![Value::Null, text("100")],
                vec![text("70"), text("999")],
            ],
        );
        let outcome = clean(&raw, &default_aliases(), true);
        assert_eq!(outcome.dataset.columns, vec!["revenue"]);
        assert_eq!(outcome.dataset.cell(0, "revenue"), &Value::Number(100.0));
        assert_eq!(outcome.dataset.cell(1, "revenue"), &Value::Number(70.0));
    }

    #[test]
    fn worked_example_missing_revenue_drops_row_and_records_issue() {
        let raw = dataset(
            &["region", "sales", "date"],
            vec![
                vec![text("A"), text("100"), text("2025-01-01")],
                vec![text("A"), Value::Null, text("2025-01-01")],
                vec![text("B"), text("50"), text("2025-01-01")],
            ],
        );
        let outcome = clean(&raw, &default_aliases(), true);

        assert_eq!(outcome.dataset.len(), 2);
        let drops: Vec<_> = outcome.issues.iter().filter(|i| i.dropped_row).collect();
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].kind, IssueKind::MissingValue);
        assert_eq!(drops[0].row, 1);

        // Conservation: cleaned rows + dropped == ingested rows.
        assert_eq!(
            outcome.dataset.len() + outcome.dropped_rows(),
            outcome.ingested_rows
        );
    }

    #[test]
    fn unparseable_revenue_text_is_one_dropping_issue_not_two() {
        let raw = dataset(
            &["revenue", "date"],
            vec![vec![text("not-a-number"), text("2025-01-01")]],
        );
        let outcome = clean(&raw, &default_aliases(), true);
        assert_eq!(outcome.dataset.len(), 0);
        let revenue_issues: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.column == CANON_REVENUE)
            .collect();
        assert_eq!(revenue_issues.len(), 1);
        assert_eq!(revenue_issues[0].kind, IssueKind::TypeMismatch);
        assert!(revenue_issues[0].dropped_row);
    }

    #[test]
    fn duplicates_dropped_or_flagged_per_config() {
        let rows = vec![
            vec![text("2025-01-01"), text("10"), text("A")],
            vec![text("2025-01-01"), text("10"), text("A")],
        ];
        let raw = dataset(&["date", "revenue", "region"], rows.clone());

        let dropped = clean(&raw, &default_aliases(), true);
        assert_eq!(dropped.dataset.len(), 1);
        assert_eq!(dropped.dropped_rows(), 1);

        let raw = dataset(&["date", "revenue", "region"], rows);
        let flagged = clean(&raw, &default_aliases(), false);
        assert_eq!(flagged.dataset.len(), 2);
        assert_eq!(flagged.dropped_rows(), 0);
        assert!(flagged
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::DuplicateRow));
    }

    #[test]
    fn text_and_serial_dates_land_in_the_same_month() {
        let raw = dataset(
            &["date", "revenue"],
            vec![
                vec![text("2025-01-05"), text("1")],
                vec![text("45662"), text("1")], // 2025-01-05 as a serial
            ],
        );
        let outcome = clean(&raw, &default_aliases(), false);
        assert_eq!(
            outcome.dataset.cell(0, "date"),
            outcome.dataset.cell(1, "date")
        );
    }

    #[test]
    fn bad_dates_become_null_with_issue_and_warning() {
        let raw = dataset(
            &["date", "revenue"],
            vec![vec![text("not a date"), text("5")]],
        );
        let outcome = clean(&raw, &default_aliases(), true);
        assert!(outcome.dataset.cell(0, "date").is_null());
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::UnparseableDate));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("unparseable or missing dates")));
    }

    #[test]
    fn missing_required_column_warns_without_dropping() {
        let raw = dataset(&["region"], vec![vec![text("A")]]);
        let outcome = clean(&raw, &default_aliases(), true);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("Missing required column: 'revenue'")));
        assert_eq!(outcome.dataset.len(), 1);
    }
}
