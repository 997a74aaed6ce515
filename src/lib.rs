//! Batch reporting pipeline: raw CSV/XLSX dumps in, a report pack out.
//!
//! The stages are plain functions over [`crate::core::Dataset`]:
//! ingestion ([`ingest`]), cleaning and validation ([`cleaning`]), KPI
//! aggregation ([`kpis`]), data-quality profiling ([`quality`]) and the
//! report writers ([`report`]). [`commands::run_pipeline`] wires them
//! together the way the CLI does.

pub mod cleaning;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod ingest;
pub mod io;
pub mod kpis;
pub mod quality;
pub mod report;
pub mod runlog;

pub use crate::core::{Dataset, ExecInsights, IssueKind, KpiTables, QualityIssue, Value};
pub use config::{AppConfig, Overrides};
pub use errors::PipelineError;
pub use report::{ReportContext, ReportWriter, WriterOutcome};
pub use runlog::RunLog;
