//! Data-quality profiling of the cleaned dataset.
//!
//! Produces the content of the data-quality workbook: dataset overview,
//! per-column missingness, whole-row duplicate count, date range, and the
//! top categories of the key dimensions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::cleaning::{CANON_DATE, CANON_PRODUCT, CANON_REGION};
use crate::core::{Dataset, Value};
use crate::ingest::SOURCE_FILE_COLUMN;

const TOP_CATEGORY_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    /// Dominant non-null value type ("number", "text", "date"), or "null"
    /// for an entirely empty column.
    pub dtype: String,
    pub missing_count: usize,
    pub missing_pct: f64,
    pub distinct: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateRangeProfile {
    pub min: NaiveDate,
    pub max: NaiveDate,
    pub valid_rows: usize,
    pub invalid_rows: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub column: String,
    pub value: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub rows: usize,
    pub columns: usize,
    /// Sorted by missing count descending, then column name.
    pub missingness: Vec<ColumnProfile>,
    pub duplicate_rows: usize,
    /// Absent when the dataset has no date column or no parseable dates.
    pub date_range: Option<DateRangeProfile>,
    pub top_categories: Vec<CategoryCount>,
}

pub fn build_profile(ds: &Dataset) -> QualityProfile {
    QualityProfile {
        rows: ds.len(),
        columns: ds.columns.len(),
        missingness: column_profiles(ds),
        duplicate_rows: duplicate_row_count(ds),
        date_range: date_range(ds),
        top_categories: top_categories(ds),
    }
}

fn column_profiles(ds: &Dataset) -> Vec<ColumnProfile> {
    let mut profiles: Vec<ColumnProfile> = ds
        .columns
        .iter()
        .map(|col| {
            let values = ds.column_values(col);
            let missing = values.iter().filter(|v| v.is_null()).count();
            let distinct: HashSet<String> = values
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| v.render())
                .collect();
            let pct = if values.is_empty() {
                0.0
            } else {
                missing as f64 * 100.0 / values.len() as f64
            };
            ColumnProfile {
                column: col.clone(),
                dtype: dominant_type(&values),
                missing_count: missing,
                missing_pct: (pct * 100.0).round() / 100.0,
                distinct: distinct.len(),
            }
        })
        .collect();
    profiles.sort_by(|a, b| {
        b.missing_count
            .cmp(&a.missing_count)
            .then_with(|| a.column.cmp(&b.column))
    });
    profiles
}

fn dominant_type(values: &[&Value]) -> String {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for v in values {
        if !v.is_null() {
            *counts.entry(v.type_name()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(name, count)| (count, name))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "null".to_string())
}

fn duplicate_row_count(ds: &Dataset) -> usize {
    let mut seen = HashSet::new();
    ds.rows
        .iter()
        .filter(|row| {
            let signature = row
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join("\u{1f}");
            !seen.insert(signature)
        })
        .count()
}

fn date_range(ds: &Dataset) -> Option<DateRangeProfile> {
    if !ds.has_column(CANON_DATE) {
        return None;
    }
    let values = ds.column_values(CANON_DATE);
    let dates: Vec<NaiveDate> = values.iter().filter_map(|v| v.as_date()).collect();
    let (min, max) = (dates.iter().min()?, dates.iter().max()?);
    Some(DateRangeProfile {
        min: *min,
        max: *max,
        valid_rows: dates.len(),
        invalid_rows: values.len() - dates.len(),
    })
}

fn top_categories(ds: &Dataset) -> Vec<CategoryCount> {
    let mut out = Vec::new();
    for col in [CANON_REGION, CANON_PRODUCT, SOURCE_FILE_COLUMN] {
        if !ds.has_column(col) {
            continue;
        }
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for v in ds.column_values(col) {
            let key = if v.is_null() {
                "Unknown".to_string()
            } else {
                v.render()
            };
            *counts.entry(key).or_default() += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        // Highest count first; BTreeMap gives a stable name order for ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (value, count) in ranked.into_iter().take(TOP_CATEGORY_LIMIT) {
            out.push(CategoryCount {
                column: col.to_string(),
                value,
                count,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn sample() -> Dataset {
        let mut ds = Dataset::new(vec!["date".into(), "revenue".into(), "region".into()]);
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        ds.push_row(vec![Value::Date(d), Value::Number(10.0), text("NSW")]);
        ds.push_row(vec![Value::Null, Value::Number(20.0), text("NSW")]);
        ds.push_row(vec![Value::Date(d), Value::Number(10.0), text("NSW")]);
        ds
    }

    #[test]
    fn overview_counts_rows_and_columns() {
        let profile = build_profile(&sample());
        assert_eq!(profile.rows, 3);
        assert_eq!(profile.columns, 3);
    }

    #[test]
    fn missingness_sorted_by_missing_count() {
        let profile = build_profile(&sample());
        assert_eq!(profile.missingness[0].column, "date");
        assert_eq!(profile.missingness[0].missing_count, 1);
        assert!((profile.missingness[0].missing_pct - 33.33).abs() < 0.01);
        assert_eq!(profile.missingness[0].dtype, "date");
    }

    #[test]
    fn duplicate_rows_counted_whole_row() {
        let profile = build_profile(&sample());
        // Row 2 repeats row 0 exactly.
        assert_eq!(profile.duplicate_rows, 1);
    }

    #[test]
    fn date_range_tracks_valid_and_invalid() {
        let profile = build_profile(&sample());
        let range = profile.date_range.unwrap();
        assert_eq!(range.valid_rows, 2);
        assert_eq!(range.invalid_rows, 1);
        assert_eq!(range.min, range.max);
    }

    #[test]
    fn top_categories_cover_known_dimensions() {
        let profile = build_profile(&sample());
        assert_eq!(
            profile.top_categories,
            vec![CategoryCount {
                column: "region".to_string(),
                value: "NSW".to_string(),
                count: 3
            }]
        );
    }
}
