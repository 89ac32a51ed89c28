// Library exports for vizpro

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod parser;

// Pipeline stages
pub mod normalize;
pub mod classify;
pub mod clean;
pub mod filter;
pub mod stats;
pub mod ir;
pub mod dispatch;
pub mod insight;
pub mod compare;
pub mod session;

// Collaborators
pub mod config;
pub mod export;
pub mod forecast;

pub use data::{Table, Value};
pub use dispatch::{render, Aggregate, ChartKind, ChartRequest};
pub use error::{ChartError, CompareError, ForecastError, PipelineError};
pub use filter::FilterSpec;
pub use session::Session;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    /// Pick a format from a file name's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
