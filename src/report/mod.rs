//! Report writers: the fan-out stage of the pipeline.
//!
//! Every artifact sits behind the [`ReportWriter`] trait so a failure in
//! one writer (disk full, file locked, missing fonts) is caught, logged to
//! the run log, and never blocks the remaining outputs. Charts render
//! before the loop because the PDF embeds their files; everything else is
//! order-independent.

pub mod charts;
pub mod csv_export;
pub mod excel;
pub mod pdf;
pub mod quality;

use log::{error, info};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::core::{Dataset, ExecInsights, KpiTables, QualityIssue};
use crate::runlog::RunLog;

pub use charts::ChartWriter;
pub use csv_export::CleanedCsvWriter;
pub use excel::ExcelPackWriter;
pub use pdf::PdfWriter;
pub use quality::QualityWorkbookWriter;

/// Everything a writer may draw from. Read-only for writers; the runner
/// fills `chart_paths` after the chart stage so the PDF can embed them.
pub struct ReportContext<'a> {
    pub config: &'a AppConfig,
    pub dataset: &'a Dataset,
    pub issues: &'a [QualityIssue],
    pub warnings: &'a [String],
    pub tables: &'a KpiTables,
    pub insights: &'a ExecInsights,
    pub out_dir: &'a Path,
    pub source_label: String,
    pub chart_paths: Vec<PathBuf>,
}

/// One output artifact. Implementations must be independent of each other:
/// no writer may rely on another writer having succeeded.
pub trait ReportWriter {
    /// Short artifact name used in logs ("excel pack", "pdf report", ...).
    fn artifact(&self) -> &'static str;

    fn enabled(&self, config: &AppConfig) -> bool;

    /// Produce the artifact, returning the created file paths.
    fn write(&self, ctx: &ReportContext) -> anyhow::Result<Vec<PathBuf>>;
}

/// Result of one writer invocation, error flattened for the run log.
#[derive(Debug)]
pub struct WriterOutcome {
    pub artifact: &'static str,
    pub paths: Vec<PathBuf>,
    pub error: Option<String>,
}

impl WriterOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Run all enabled writers, isolating failures.
///
/// Returns one outcome per enabled writer; callers can inspect them, but
/// failures are already logged here.
pub fn write_all(ctx: &mut ReportContext, log: &mut RunLog) -> Vec<WriterOutcome> {
    let mut outcomes = Vec::new();

    // Charts come first: the PDF embeds their output. A chart failure is
    // still isolated; the PDF just renders without images.
    let chart_writer = ChartWriter;
    if chart_writer.enabled(ctx.config) {
        let outcome = invoke(&chart_writer, ctx, log);
        if outcome.succeeded() {
            ctx.chart_paths = outcome.paths.clone();
        }
        outcomes.push(outcome);
    }

    let writers: [&dyn ReportWriter; 4] = [
        &ExcelPackWriter,
        &PdfWriter,
        &QualityWorkbookWriter,
        &CleanedCsvWriter,
    ];
    for writer in writers {
        if writer.enabled(ctx.config) {
            outcomes.push(invoke(writer, ctx, log));
        }
    }
    outcomes
}

fn invoke(writer: &dyn ReportWriter, ctx: &ReportContext, log: &mut RunLog) -> WriterOutcome {
    match writer.write(ctx) {
        Ok(paths) => {
            for path in &paths {
                info!("{} written: {}", writer.artifact(), path.display());
            }
            log.stage(format!(
                "{} written ({} file{})",
                writer.artifact(),
                paths.len(),
                if paths.len() == 1 { "" } else { "s" }
            ));
            WriterOutcome {
                artifact: writer.artifact(),
                paths,
                error: None,
            }
        }
        Err(e) => {
            error!("{} failed: {e:#}", writer.artifact());
            log.error(format!("{} failed: {e:#}", writer.artifact()));
            WriterOutcome {
                artifact: writer.artifact(),
                paths: Vec::new(),
                error: Some(format!("{e:#}")),
            }
        }
    }
}

/// "1,234.57" style grouping used by the PDF and the run summary.
pub(crate) fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

pub(crate) fn fmt_currency(code: &str, value: f64) -> String {
    format!("{code} {}", group_thousands(value))
}

pub(crate) fn fmt_pct(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

pub(crate) fn month_label(month: chrono::NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_thousands_inserts_separators() {
        assert_eq!(group_thousands(1234567.891), "1,234,567.89");
        assert_eq!(group_thousands(999.0), "999.00");
        assert_eq!(group_thousands(-1234.5), "-1,234.50");
        assert_eq!(group_thousands(0.0), "0.00");
    }

    #[test]
    fn fmt_pct_scales_ratio() {
        assert_eq!(fmt_pct(0.1234), "12.34%");
    }

    #[test]
    fn fmt_currency_prefixes_code() {
        assert_eq!(fmt_currency("AUD", 1500.0), "AUD 1,500.00");
    }
}
