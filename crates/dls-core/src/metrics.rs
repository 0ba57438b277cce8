//! Rendering of scan results.
//!
//! The Prometheus document carries a single gauge family. Each series is
//! labelled with the directory and file name of one deleted library.

use crate::scan::{LibraryProcessCounts, ScanReport};
use dls_common::{Error, OutputFormat, Result, SCHEMA_VERSION};
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Gauge family name.
pub const METRIC_NAME: &str = "node_processes_linking_deleted_libraries";

/// Gauge family help text.
pub const METRIC_HELP: &str = "Count of running processes that link a deleted library";

/// Label holding the library's directory.
pub const LABEL_LIBRARY_PATH: &str = "library_path";

/// Label holding the library's file name.
pub const LABEL_LIBRARY_NAME: &str = "library_name";

/// One library row of the JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryEntry<'a> {
    pub library_path: &'a str,
    pub library_name: &'a str,
    pub processes: u64,
}

/// JSON report document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub schema_version: &'static str,
    pub processes_scanned: usize,
    pub processes_vanished: usize,
    pub processes_affected: usize,
    pub libraries: Vec<LibraryEntry<'a>>,
}

impl<'a> JsonReport<'a> {
    pub fn new(libraries: &'a LibraryProcessCounts, report: &ScanReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            processes_scanned: report.processes_scanned,
            processes_vanished: report.processes_vanished,
            processes_affected: report.processes_affected,
            libraries: libraries
                .iter()
                .map(|(library, count)| LibraryEntry {
                    library_path: library.directory(),
                    library_name: library.file_name(),
                    processes: *count,
                })
                .collect(),
        }
    }
}

/// Build a fresh registry holding the gauge family for `libraries`.
pub fn build_registry(libraries: &LibraryProcessCounts) -> Result<Registry> {
    let registry = Registry::new();
    let gauge = IntGaugeVec::new(
        Opts::new(METRIC_NAME, METRIC_HELP),
        &[LABEL_LIBRARY_PATH, LABEL_LIBRARY_NAME],
    )
    .map_err(metrics_error)?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(metrics_error)?;

    for (library, count) in libraries.iter() {
        let value = i64::try_from(*count)
            .map_err(|_| Error::Metrics(format!("count for {library} overflows a gauge")))?;
        gauge
            .get_metric_with_label_values(&[library.directory(), library.file_name()])
            .map_err(metrics_error)?
            .set(value);
    }
    Ok(registry)
}

/// Encode `libraries` in the Prometheus text exposition format.
///
/// The registry drops families without series, so an empty scan still gets
/// the `# HELP` and `# TYPE` header written here.
pub fn render_prometheus(libraries: &LibraryProcessCounts) -> Result<String> {
    if libraries.is_empty() {
        return Ok(format!(
            "# HELP {METRIC_NAME} {METRIC_HELP}\n# TYPE {METRIC_NAME} gauge\n"
        ));
    }
    let registry = build_registry(libraries)?;
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(metrics_error)?;
    String::from_utf8(buffer).map_err(|e| Error::Metrics(e.to_string()))
}

/// Encode the scan result as a pretty-printed JSON report.
pub fn render_json(libraries: &LibraryProcessCounts, report: &ScanReport) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&JsonReport::new(libraries, report))?;
    out.push('\n');
    Ok(out)
}

/// Render in the requested format.
pub fn render(
    format: OutputFormat,
    libraries: &LibraryProcessCounts,
    report: &ScanReport,
) -> Result<String> {
    match format {
        OutputFormat::Prometheus => render_prometheus(libraries),
        OutputFormat::Json => render_json(libraries, report),
    }
}

fn metrics_error(err: prometheus::Error) -> Error {
    Error::Metrics(err.to_string())
}
