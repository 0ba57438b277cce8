//! Output format selection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the scan result is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Prometheus text exposition format.
    #[default]
    Prometheus,
    /// Machine-readable JSON report.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Prometheus => write!(f, "prometheus"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
