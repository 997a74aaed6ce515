//! Data-quality workbook writer (`data_quality.xlsx`).
//!
//! One sheet per profile section (Overview, DateRange, Duplicates,
//! Missingness, TopCategories) plus an Issues sheet listing every
//! [`QualityIssue`] the cleaner recorded.

use anyhow::Context;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::PathBuf;

use super::excel::{write_table_at, Cell, Table};
use super::{ReportContext, ReportWriter};
use crate::quality::{build_profile, QualityProfile};

pub const QUALITY_FILE: &str = "data_quality.xlsx";

pub struct QualityWorkbookWriter;

impl ReportWriter for QualityWorkbookWriter {
    fn artifact(&self) -> &'static str {
        "data quality report"
    }

    fn enabled(&self, config: &crate::config::AppConfig) -> bool {
        config.write_quality_report
    }

    fn write(&self, ctx: &ReportContext) -> anyhow::Result<Vec<PathBuf>> {
        let path = ctx.out_dir.join(QUALITY_FILE);
        let profile = build_profile(ctx.dataset);
        let mut workbook = Workbook::new();

        write_sheet(workbook.add_worksheet(), "Overview", &overview_table(&profile))
            .context("overview sheet")?;
        write_sheet(
            workbook.add_worksheet(),
            "DateRange",
            &date_range_table(&profile),
        )
        .context("date range sheet")?;
        write_sheet(
            workbook.add_worksheet(),
            "Duplicates",
            &duplicates_table(&profile),
        )
        .context("duplicates sheet")?;
        write_sheet(
            workbook.add_worksheet(),
            "Missingness",
            &missingness_table(&profile),
        )
        .context("missingness sheet")?;
        write_sheet(
            workbook.add_worksheet(),
            "TopCategories",
            &categories_table(&profile),
        )
        .context("top categories sheet")?;
        write_sheet(workbook.add_worksheet(), "Issues", &issues_table(ctx))
            .context("issues sheet")?;

        workbook
            .save(&path)
            .with_context(|| format!("save {}", path.display()))?;
        Ok(vec![path])
    }
}

fn write_sheet(sheet: &mut Worksheet, name: &str, table: &Table) -> Result<(), XlsxError> {
    sheet.set_name(name)?;
    write_table_at(sheet, 0, table, "#,##0.00")?;
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn metric_table(rows: Vec<(&str, String)>) -> Table {
    Table {
        headers: vec!["metric".to_string(), "value".to_string()],
        rows: rows
            .into_iter()
            .map(|(metric, value)| vec![Cell::text(metric), Cell::text(&value)])
            .collect(),
    }
}

fn overview_table(profile: &QualityProfile) -> Table {
    metric_table(vec![
        ("rows", profile.rows.to_string()),
        ("columns", profile.columns.to_string()),
    ])
}

fn date_range_table(profile: &QualityProfile) -> Table {
    match &profile.date_range {
        Some(range) => metric_table(vec![
            ("min_date", range.min.to_string()),
            ("max_date", range.max.to_string()),
            ("rows_with_valid_date", range.valid_rows.to_string()),
            ("rows_with_invalid_date", range.invalid_rows.to_string()),
        ]),
        None => metric_table(vec![("date_column_present", "false".to_string())]),
    }
}

fn duplicates_table(profile: &QualityProfile) -> Table {
    metric_table(vec![("duplicate_rows", profile.duplicate_rows.to_string())])
}

fn missingness_table(profile: &QualityProfile) -> Table {
    Table {
        headers: [
            "column",
            "dtype",
            "missing_count",
            "missing_pct",
            "distinct_count",
        ]
        .map(String::from)
        .to_vec(),
        rows: profile
            .missingness
            .iter()
            .map(|c| {
                vec![
                    Cell::text(&c.column),
                    Cell::text(&c.dtype),
                    Cell::Number(c.missing_count as f64),
                    Cell::Number(c.missing_pct),
                    Cell::Number(c.distinct as f64),
                ]
            })
            .collect(),
    }
}

fn categories_table(profile: &QualityProfile) -> Table {
    Table {
        headers: ["column", "category", "row_count"].map(String::from).to_vec(),
        rows: profile
            .top_categories
            .iter()
            .map(|c| {
                vec![
                    Cell::text(&c.column),
                    Cell::text(&c.value),
                    Cell::Number(c.count as f64),
                ]
            })
            .collect(),
    }
}

fn issues_table(ctx: &ReportContext) -> Table {
    Table {
        headers: ["row", "column", "kind", "detail", "row_excluded"]
            .map(String::from)
            .to_vec(),
        rows: ctx
            .issues
            .iter()
            .map(|issue| {
                vec![
                    Cell::Number(issue.row as f64),
                    Cell::text(&issue.column),
                    Cell::text(&issue.kind.to_string()),
                    Cell::text(&issue.detail),
                    Cell::text(if issue.dropped_row { "yes" } else { "no" }),
                ]
            })
            .collect(),
    }
}
