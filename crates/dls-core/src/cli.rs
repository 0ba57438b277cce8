//! Command-line interface.

use crate::config::{
    ScanConfig, DEFAULT_DELETION_MARKER, DEFAULT_LIBRARY_MARKER, DEFAULT_PROC_ROOT,
};
use crate::logging::{LogFormat, LogSettings};
use clap::Parser;
use dls_common::OutputFormat;
use std::path::PathBuf;

/// Count running processes that still map deleted shared libraries.
///
/// Prints a Prometheus text document on stdout. Intended to be run by a
/// metrics collector such as the node exporter textfile hook.
#[derive(Debug, Clone, Parser)]
#[command(name = "dls-core", version, about, long_about = None)]
pub struct Cli {
    /// Mount point of the proc filesystem
    #[arg(long, env = "DLS_PROC_ROOT", default_value = DEFAULT_PROC_ROOT)]
    pub proc_root: PathBuf,

    /// Path substring that marks a shared-library directory
    #[arg(long, env = "DLS_LIBRARY_MARKER", default_value = DEFAULT_LIBRARY_MARKER)]
    pub library_marker: String,

    /// Annotation substring that marks a deleted backing file
    #[arg(long, env = "DLS_DELETION_MARKER", default_value = DEFAULT_DELETION_MARKER)]
    pub deletion_marker: String,

    /// Output format
    #[arg(long, value_enum, default_value = "prometheus")]
    pub format: OutputFormat,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "dls_core=trace")
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(&self.proc_root)
            .with_library_marker(&self.library_marker)
            .with_deletion_marker(&self.deletion_marker)
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }
}
