//! Cleaned dataset export (`cleaned_data.csv`).
//!
//! Writes the post-cleaning table exactly as the aggregation stage saw it,
//! with dates in ISO form, so downstream tooling can reproduce every KPI.

use anyhow::Context;
use std::path::PathBuf;

use super::{ReportContext, ReportWriter};

pub const CLEANED_CSV_FILE: &str = "cleaned_data.csv";

pub struct CleanedCsvWriter;

impl ReportWriter for CleanedCsvWriter {
    fn artifact(&self) -> &'static str {
        "cleaned csv"
    }

    fn enabled(&self, config: &crate::config::AppConfig) -> bool {
        config.write_cleaned_csv
    }

    fn write(&self, ctx: &ReportContext) -> anyhow::Result<Vec<PathBuf>> {
        let path = ctx.out_dir.join(CLEANED_CSV_FILE);
        let mut writer = ::csv::Writer::from_path(&path)
            .with_context(|| format!("create {}", path.display()))?;

        writer
            .write_record(&ctx.dataset.columns)
            .context("write header")?;
        for row in &ctx.dataset.rows {
            let record: Vec<String> = row.iter().map(|v| v.render()).collect();
            writer.write_record(&record).context("write row")?;
        }
        writer.flush().context("flush csv")?;

        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::{Dataset, ExecInsights, KpiTables, Value};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn writes_headers_and_iso_dates() {
        let mut dataset = Dataset::new(vec!["date".to_string(), "revenue".to_string()]);
        dataset.push_row(vec![
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            Value::Number(120.5),
        ]);
        dataset.push_row(vec![Value::Null, Value::Number(80.0)]);

        let tmp = TempDir::new().unwrap();
        let ctx = ReportContext {
            config: &AppConfig::default(),
            dataset: &dataset,
            issues: &[],
            warnings: &[],
            tables: &KpiTables::default(),
            insights: &ExecInsights::default(),
            out_dir: tmp.path(),
            source_label: "test".to_string(),
            chart_paths: Vec::new(),
        };

        let paths = CleanedCsvWriter.write(&ctx).unwrap();
        let contents = std::fs::read_to_string(&paths[0]).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("date,revenue"));
        assert_eq!(lines.next(), Some("2024-01-15,120.5"));
        assert_eq!(lines.next(), Some(",80"));
    }
}
