//! Run log: an ordered, timestamped record of pipeline stages and errors.
//!
//! Kept in memory for the whole run and flushed to `run_log.txt` at the
//! end — including after a fatal abort once the output directory exists —
//! so the file always reflects the true stopping point.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::io;

#[derive(Debug)]
pub struct RunLog {
    started: chrono::DateTime<Local>,
    lines: Vec<String>,
    /// Set once the output directory has been created; fatal-abort flushing
    /// only happens when this is known, which keeps "missing config means
    /// zero output files" true.
    flush_dir: Option<PathBuf>,
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            lines: Vec::new(),
            flush_dir: None,
        }
    }

    pub fn set_flush_dir(&mut self, dir: &Path) {
        self.flush_dir = Some(dir.to_path_buf());
    }

    pub fn flush_dir(&self) -> Option<&Path> {
        self.flush_dir.as_deref()
    }

    /// Record a stage transition or status line.
    pub fn stage(&mut self, message: impl AsRef<str>) {
        self.push("INFO", message.as_ref());
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.push("WARN", message.as_ref());
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.push("ERROR", message.as_ref());
    }

    fn push(&mut self, level: &str, message: &str) {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.lines.push(format!("{ts} {level:5} {message}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Analyst Reporting Pack - Run Log\n");
        out.push_str(&format!(
            "Started: {}\n\n",
            self.started.format("%Y-%m-%d %H:%M:%S")
        ));
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Write the log to `<dir>/run_log.txt`.
    pub fn flush_to(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join("run_log.txt");
        io::write_file(&path, &self.render())?;
        Ok(path)
    }

    /// Flush to the recorded output directory, if one was resolved.
    pub fn flush(&self) -> anyhow::Result<Option<PathBuf>> {
        match &self.flush_dir {
            Some(dir) => Ok(Some(self.flush_to(dir)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_ordered_and_levelled() {
        let mut log = RunLog::new();
        log.stage("config resolved");
        log.error("pdf writer failed");
        let rendered = log.render();
        let config_pos = rendered.find("config resolved").unwrap();
        let error_pos = rendered.find("pdf writer failed").unwrap();
        assert!(config_pos < error_pos);
        assert!(rendered.contains("ERROR"));
    }

    #[test]
    fn flush_writes_run_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::new();
        log.stage("hello");
        log.set_flush_dir(dir.path());
        let path = log.flush().unwrap().unwrap();
        assert!(path.ends_with("run_log.txt"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("hello"));
    }

    #[test]
    fn flush_without_dir_is_a_noop() {
        let log = RunLog::new();
        assert!(log.flush().unwrap().is_none());
    }
}
