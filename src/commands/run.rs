//! The `run` command: the whole pipeline from raw dumps to report pack.
//!
//! Stage failures split two ways. Config and ingest problems are fatal and
//! abort the run (flushing the run log when the output directory already
//! exists). Writer failures are isolated by the report layer; the run
//! finishes and reports them in the summary and the run log.

use anyhow::Result;
use colored::Colorize;
use log::info;
use std::path::{Path, PathBuf};

use crate::cleaning;
use crate::config::{AppConfig, Overrides};
use crate::ingest;
use crate::io;
use crate::kpis;
use crate::report::{self, ReportContext, WriterOutcome};
use crate::runlog::RunLog;

pub struct RunOptions {
    pub config_path: PathBuf,
    pub overrides: Overrides,
}

/// What a finished run produced, for the CLI summary and tests.
#[derive(Debug)]
pub struct RunReport {
    pub out_dir: PathBuf,
    pub ingested_rows: usize,
    pub cleaned_rows: usize,
    pub dropped_rows: usize,
    pub issue_count: usize,
    pub outcomes: Vec<WriterOutcome>,
}

impl RunReport {
    pub fn failed_artifacts(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.artifact)
            .collect()
    }
}

pub fn run_pipeline(options: &RunOptions) -> Result<RunReport> {
    let mut log = RunLog::new();
    log.stage(format!("config: {}", options.config_path.display()));

    // A bad config is fatal before any output exists, so nothing to flush.
    let config = AppConfig::resolve(&options.config_path, &options.overrides)?;

    io::ensure_dir(&config.out_dir)?;
    log.set_flush_dir(&config.out_dir);
    log.stage(format!("output directory: {}", config.out_dir.display()));

    match execute(&config, &mut log) {
        Ok(report) => {
            log.stage("run complete");
            if config.write_run_log {
                log.flush()?;
            }
            print_summary(&report);
            Ok(report)
        }
        Err(e) => {
            log.error(format!("fatal: {e:#}"));
            if config.write_run_log {
                let _ = log.flush();
            }
            Err(e)
        }
    }
}

fn execute(config: &AppConfig, log: &mut RunLog) -> Result<RunReport> {
    let inputs = ingest::discover_inputs(&config.input_dir);
    log.stage(format!(
        "discovered {} input file(s) under {}",
        inputs.len(),
        config.input_dir.display()
    ));

    let raw = ingest::read_all(&config.input_dir)?;
    log.stage(format!("ingested {} row(s)", raw.len()));

    let outcome = cleaning::clean(&raw, &config.merged_aliases(), config.drop_duplicates);
    for warning in &outcome.warnings {
        log.warning(warning);
    }
    log.stage(format!(
        "cleaned: {} kept, {} dropped, {} issue(s)",
        outcome.dataset.len(),
        outcome.dropped_rows(),
        outcome.issues.len()
    ));

    let tables = kpis::build_tables(&outcome.dataset);
    let insights = kpis::build_insights(&tables);
    log.stage(format!(
        "aggregated: {} trend month(s), {} region row(s), {} product row(s)",
        tables.trends.len(),
        tables.by_region.len(),
        tables.by_product.len()
    ));

    let mut ctx = ReportContext {
        config,
        dataset: &outcome.dataset,
        issues: &outcome.issues,
        warnings: &outcome.warnings,
        tables: &tables,
        insights: &insights,
        out_dir: &config.out_dir,
        source_label: source_label(&config.input_dir, &inputs),
        chart_paths: Vec::new(),
    };
    let outcomes = report::write_all(&mut ctx, log);

    Ok(RunReport {
        out_dir: config.out_dir.clone(),
        ingested_rows: outcome.ingested_rows,
        cleaned_rows: outcome.dataset.len(),
        dropped_rows: outcome.dropped_rows(),
        issue_count: outcome.issues.len(),
        outcomes,
    })
}

/// Short human label for where the data came from, used on the PDF cover.
fn source_label(input_dir: &Path, inputs: &[PathBuf]) -> String {
    let names: Vec<String> = inputs
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    match names.len() {
        0 => input_dir.display().to_string(),
        1..=4 => names.join(", "),
        n => format!("{} files under {}", n, input_dir.display()),
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Reporting pack run".bold());
    println!(
        "  rows: {} ingested, {} kept, {} dropped ({} issue(s))",
        report.ingested_rows, report.cleaned_rows, report.dropped_rows, report.issue_count
    );
    for outcome in &report.outcomes {
        if outcome.succeeded() {
            for path in &outcome.paths {
                println!("  {} {}: {}", "ok".green(), outcome.artifact, path.display());
            }
            if outcome.paths.is_empty() {
                println!("  {} {}: nothing to render", "ok".green(), outcome.artifact);
            }
        } else {
            println!(
                "  {} {}: {}",
                "failed".red().bold(),
                outcome.artifact,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    info!("artifacts written to {}", report.out_dir.display());
}
