//! Fatal error taxonomy for the reporting pipeline.
//!
//! Only two failure classes abort a run: a missing or malformed
//! configuration file, and unreadable (or absent) input data. Everything
//! else is recoverable — per-row defects become [`crate::core::QualityIssue`]
//! records and per-writer failures are logged while the remaining writers
//! still run. Orchestration code propagates these through `anyhow::Result`;
//! the binary maps them to exit code 2.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration file missing or malformed. Aborts before any output.
    #[error("config error: {message} ({})", path.display())]
    Config { message: String, path: PathBuf },

    /// Input file unreadable or no usable inputs found. Aborts rather than
    /// skips, since aggregation needs the complete dataset.
    #[error("ingest error: {message} ({})", path.display())]
    Ingest { message: String, path: PathBuf },
}

impl PipelineError {
    pub fn config(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn ingest(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Ingest {
            message: message.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_path() {
        let err = PipelineError::config("not found", "config.yaml");
        assert_eq!(err.to_string(), "config error: not found (config.yaml)");
    }
}
