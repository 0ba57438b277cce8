//! Sources of per-process mapping data.
//!
//! [`ProcFs`] reads a real (or fake) proc tree. Tests substitute their own
//! [`ProcSource`] to simulate races and permission failures.

use dls_common::{Error, ProcessId, Result};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// One process's mapping-data source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessHandle {
    pub pid: ProcessId,
    pub maps_path: PathBuf,
}

impl ProcessHandle {
    /// Handle for `<proc_root>/<pid>/maps`.
    pub fn new(proc_root: &Path, pid: ProcessId) -> Self {
        Self {
            pid,
            maps_path: proc_root.join(pid.to_string()).join("maps"),
        }
    }
}

/// Outcome of a failed attempt to open a mapping source.
#[derive(Debug, Error)]
pub enum MapsOpenError {
    /// The process exited between enumeration and open.
    #[error("process vanished: {}", path.display())]
    Vanished { path: PathBuf },

    /// Anything else; aborts the scan.
    #[error("failed to open file: {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MapsOpenError {
    /// Classify an open error by kind, never by raw errno.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            MapsOpenError::Vanished {
                path: path.to_path_buf(),
            }
        } else {
            MapsOpenError::Access {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// A process table that can be enumerated and whose mapping files can be
/// opened one at a time.
pub trait ProcSource {
    /// Every process visible right now.
    fn processes(&self) -> Result<Vec<ProcessHandle>>;

    /// Open the mapping data of one process for line-by-line reading.
    fn open_maps(
        &self,
        handle: &ProcessHandle,
    ) -> std::result::Result<Box<dyn BufRead + '_>, MapsOpenError>;
}

/// The proc filesystem mounted at `root`.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProcSource for ProcFs {
    fn processes(&self) -> Result<Vec<ProcessHandle>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            Error::Collection(format!("cannot list {}: {e}", self.root.display()))
        })?;

        let mut handles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::Collection(format!("cannot list {}: {e}", self.root.display()))
            })?;
            let name = entry.file_name();
            let Some(pid) = name.to_str().and_then(ProcessId::parse) else {
                trace!(entry = ?name, "skipping non-process entry");
                continue;
            };
            handles.push(ProcessHandle::new(&self.root, pid));
        }
        handles.sort();
        Ok(handles)
    }

    fn open_maps(
        &self,
        handle: &ProcessHandle,
    ) -> std::result::Result<Box<dyn BufRead + '_>, MapsOpenError> {
        let file = File::open(&handle.maps_path)
            .map_err(|e| MapsOpenError::from_io(&handle.maps_path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
