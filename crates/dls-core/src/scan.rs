//! Deleted-library scan and aggregation.
//!
//! One forward pass: enumerate processes, classify every mapping line, count
//! deleted-library hits per process, then collapse those into the number of
//! distinct processes per library.
//!
//! # Error policy
//! - A mapping file that no longer exists means the process exited after
//!   enumeration. The process is skipped.
//! - Any other open failure, a read failure, or a line that is not UTF-8
//!   aborts the whole scan. There is no partial result.
//! - Lines with an unexpected field count are ignored.

use crate::collect::{
    split_fields, MapsOpenError, MappingRecord, ProcSource, ProcessHandle,
};
use crate::config::ScanConfig;
use dls_common::{Error, LibraryPath, Result};
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::io::BufRead;
use tracing::{debug, trace};

/// Deleted-library hits within one process, keyed by library path.
///
/// A library usually shows up several times per process (one mapping per
/// segment), so values are often greater than one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessLibraryCounts {
    counts: BTreeMap<LibraryPath, u64>,
}

impl ProcessLibraryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert-zero, then add one. Returns the new count.
    pub fn increment(&mut self, library: &str) -> u64 {
        let count = self.counts.entry(LibraryPath::from(library)).or_insert(0);
        *count += 1;
        *count
    }

    pub fn get(&self, library: &str) -> Option<u64> {
        self.counts.get(&LibraryPath::from(library)).copied()
    }

    /// Distinct libraries hit in this process.
    pub fn libraries(&self) -> impl Iterator<Item = &LibraryPath> {
        self.counts.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, LibraryPath, u64> {
        self.counts.iter()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// [`ProcessLibraryCounts`] for every process with at least one hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerProcessCounts {
    processes: BTreeMap<ProcessHandle, ProcessLibraryCounts>,
}

impl PerProcessCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for one process, inserting an empty entry if unseen.
    pub fn entry(&mut self, handle: &ProcessHandle) -> &mut ProcessLibraryCounts {
        self.processes.entry(handle.clone()).or_default()
    }

    pub fn get(&self, handle: &ProcessHandle) -> Option<&ProcessLibraryCounts> {
        self.processes.get(handle)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ProcessHandle, ProcessLibraryCounts> {
        self.processes.iter()
    }

    /// Number of processes with at least one hit.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

/// Number of distinct processes mapping each deleted library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LibraryProcessCounts {
    counts: BTreeMap<LibraryPath, u64>,
}

impl LibraryProcessCounts {
    pub fn get(&self, library: &str) -> Option<u64> {
        self.counts.get(&LibraryPath::from(library)).copied()
    }

    /// Libraries in path order.
    pub fn iter(&self) -> btree_map::Iter<'_, LibraryPath, u64> {
        self.counts.iter()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Bookkeeping for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Processes whose mapping file was read to the end.
    pub processes_scanned: usize,
    /// Processes that exited between enumeration and open.
    pub processes_vanished: usize,
    /// Processes with at least one deleted-library mapping.
    pub processes_affected: usize,
}

/// Result of [`scan_all_processes`].
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub per_process: PerProcessCounts,
    pub report: ScanReport,
}

/// Classify one mapping line and record it if it is a deleted library.
///
/// Returns `None` when the line does not have the full field count.
/// Otherwise returns the path field and whether it was counted as a hit.
pub fn classify_mapping_record<'a>(
    counts: &mut PerProcessCounts,
    handle: &ProcessHandle,
    fields: &[&'a str],
    config: &ScanConfig,
) -> Option<(&'a str, bool)> {
    let record = MappingRecord::from_fields(fields)?;
    let hit = record.is_deleted_library(&config.library_marker, &config.deletion_marker);
    if hit {
        let count = counts.entry(handle).increment(record.path);
        trace!(pid = %handle.pid, library = record.path, count, "deleted library mapping");
    }
    Some((record.path, hit))
}

/// Read every process's mapping file and count deleted-library hits.
pub fn scan_all_processes(
    source: &dyn ProcSource,
    config: &ScanConfig,
) -> Result<ScanOutcome> {
    let handles = source.processes()?;
    debug!(processes = handles.len(), "enumerated process table");

    let mut outcome = ScanOutcome::default();
    for handle in &handles {
        let reader = match source.open_maps(handle) {
            Ok(reader) => reader,
            Err(MapsOpenError::Vanished { path }) => {
                debug!(pid = %handle.pid, path = %path.display(), "process exited before scan");
                outcome.report.processes_vanished += 1;
                continue;
            }
            Err(MapsOpenError::Access { path, source: err }) => {
                return Err(Error::AccessFailed { path, source: err });
            }
        };
        scan_process(reader, handle, config, &mut outcome.per_process)?;
        outcome.report.processes_scanned += 1;
    }

    outcome.report.processes_affected = outcome.per_process.len();
    debug!(
        scanned = outcome.report.processes_scanned,
        vanished = outcome.report.processes_vanished,
        affected = outcome.report.processes_affected,
        "scan complete"
    );
    Ok(outcome)
}

/// Drain one mapping file. The reader is dropped on every exit path.
fn scan_process(
    mut reader: Box<dyn BufRead + '_>,
    handle: &ProcessHandle,
    config: &ScanConfig,
    counts: &mut PerProcessCounts,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| Error::ReadFailed {
                path: handle.maps_path.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(());
        }
        line_no += 1;

        let line = std::str::from_utf8(&buf).map_err(|_| Error::Decode {
            path: handle.maps_path.clone(),
            line: line_no,
        })?;
        classify_mapping_record(counts, handle, &split_fields(line), config);
    }
}

/// Collapse per-process hit counts into distinct-process counts.
///
/// Each process adds exactly one to every library it maps, however many of
/// its mappings point at that library.
pub fn derive_library_process_counts(per_process: &PerProcessCounts) -> LibraryProcessCounts {
    let mut counts: BTreeMap<LibraryPath, u64> = BTreeMap::new();
    for (_, libraries) in per_process.iter() {
        for library in libraries.libraries() {
            *counts.entry(library.clone()).or_insert(0) += 1;
        }
    }
    LibraryProcessCounts { counts }
}
