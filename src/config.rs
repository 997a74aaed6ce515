//! Run configuration loaded from `config.yaml`.
//!
//! Every field has a default so a minimal (or empty) mapping is a valid
//! config; a missing or malformed file is fatal. CLI flags override the
//! file via [`AppConfig::resolve`].

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cleaning::{default_aliases, snake_name};
use crate::errors::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned (recursively) for CSV/XLSX dumps.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory all artifacts are written under.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// ISO-ish currency code shown in report number formats (e.g. AUD, USD).
    #[serde(default = "default_currency")]
    pub currency_code: String,

    /// Extra column aliases merged over the built-in set. Keys are
    /// normalized the same way headers are, so `"Sales($)"` works.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    #[serde(default = "default_report_title")]
    pub report_title: String,

    #[serde(default)]
    pub report_subtitle: String,

    /// Free-text notes appended to the PDF; a single string or a list.
    #[serde(default, deserialize_with = "string_or_list")]
    pub notes: Vec<String>,

    // Output toggles. All artifacts are on by default.
    #[serde(default = "default_true")]
    pub make_pdf: bool,
    #[serde(default = "default_true")]
    pub write_excel_pack: bool,
    #[serde(default = "default_true")]
    pub write_charts: bool,
    #[serde(default = "default_true")]
    pub write_cleaned_csv: bool,
    #[serde(default = "default_true")]
    pub write_quality_report: bool,
    #[serde(default = "default_true")]
    pub write_run_log: bool,

    /// Drop whole-row duplicates (true) or only flag them (false).
    #[serde(default = "default_true")]
    pub drop_duplicates: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        // An empty YAML mapping deserializes to all defaults.
        serde_yaml::from_str("{}").expect("default config must deserialize")
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data/in")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_currency() -> String {
    "AUD".to_string()
}

fn default_report_title() -> String {
    "Analyst Reporting Pack".to_string()
}

fn default_true() -> bool {
    true
}

/// Accepts `notes: "one line"` as well as `notes: [a, b]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<Option<String>>),
    }

    let parsed = Option::<OneOrMany>::deserialize(deserializer)?;
    let notes = match parsed {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => {
            let s = s.trim().to_string();
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
        Some(OneOrMany::Many(items)) => items
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };
    Ok(notes)
}

/// CLI overrides applied on top of the loaded file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub currency_code: Option<String>,
    pub make_pdf: Option<bool>,
}

impl AppConfig {
    /// Load from a YAML file. Missing or malformed files are fatal.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::config(format!("cannot read config: {e}"), path))?;
        let mut cfg: AppConfig = serde_yaml::from_str(&text)
            .map_err(|e| PipelineError::config(format!("invalid YAML: {e}"), path))?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Load and apply CLI overrides.
    pub fn resolve(path: &Path, overrides: &Overrides) -> Result<Self, PipelineError> {
        let mut cfg = Self::load(path)?;
        if let Some(dir) = &overrides.input_dir {
            cfg.input_dir = dir.clone();
        }
        if let Some(dir) = &overrides.out_dir {
            cfg.out_dir = dir.clone();
        }
        if let Some(code) = &overrides.currency_code {
            cfg.currency_code = code.clone();
        }
        if let Some(pdf) = overrides.make_pdf {
            cfg.make_pdf = pdf;
        }
        cfg.normalize();
        Ok(cfg)
    }

    fn normalize(&mut self) {
        self.currency_code = self.currency_code.trim().to_uppercase();
        if self.currency_code.is_empty() {
            self.currency_code = default_currency();
        }
        self.report_title = self.report_title.trim().to_string();
        if self.report_title.is_empty() {
            self.report_title = default_report_title();
        }
        self.report_subtitle = self.report_subtitle.trim().to_string();
    }

    /// Built-in aliases extended by the configured ones, keys normalized
    /// like headers are.
    pub fn merged_aliases(&self) -> BTreeMap<String, String> {
        let mut merged = default_aliases();
        for (k, v) in &self.aliases {
            merged.insert(snake_name(k), snake_name(v));
        }
        merged
    }
}
