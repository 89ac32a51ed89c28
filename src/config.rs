use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::forecast::HoltLinear;
use crate::RenderOptions;

/// Application settings. Every field has a default, so an empty JSON
/// object (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderOptions,
    pub export: ExportConfig,
    pub forecast: HoltLinear,
}

/// Destination directories for exported artifacts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub charts_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub data_dir: PathBuf,
    pub report_format: ReportFormat,
}

/// File type of the insights report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Text,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            charts_dir: PathBuf::from("charts"),
            reports_dir: PathBuf::from("reports"),
            data_dir: PathBuf::from("exports"),
            report_format: ReportFormat::Pdf,
        }
    }
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse configuration JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
