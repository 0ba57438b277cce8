//! Scan configuration.
//!
//! Resolution order is CLI flag, then environment variable, then the
//! defaults below (see [`crate::cli::Cli`]).

use dls_common::{Error, Result};
use std::path::PathBuf;

/// Mount point of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Substring of a mapping path that marks a shared-library directory.
pub const DEFAULT_LIBRARY_MARKER: &str = "/lib/";

/// Annotation the kernel appends to a mapping whose file was unlinked.
pub const DEFAULT_DELETION_MARKER: &str = "(deleted)";

/// Resolved settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Directory holding one `<pid>/maps` entry per process.
    pub proc_root: PathBuf,

    /// A mapping is a library only if its path contains this.
    pub library_marker: String,

    /// A mapping is deleted only if its annotation contains this.
    pub deletion_marker: String,
}

impl ScanConfig {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            ..Self::default()
        }
    }

    pub fn with_library_marker(mut self, marker: impl Into<String>) -> Self {
        self.library_marker = marker.into();
        self
    }

    pub fn with_deletion_marker(mut self, marker: impl Into<String>) -> Self {
        self.deletion_marker = marker.into();
        self
    }

    /// Reject settings that would make every mapping match.
    pub fn validate(&self) -> Result<()> {
        if self.library_marker.is_empty() {
            return Err(Error::Config("library marker must not be empty".into()));
        }
        if self.deletion_marker.is_empty() {
            return Err(Error::Config("deletion marker must not be empty".into()));
        }
        if self.proc_root.as_os_str().is_empty() {
            return Err(Error::Config("proc root must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            library_marker: DEFAULT_LIBRARY_MARKER.to_string(),
            deletion_marker: DEFAULT_DELETION_MARKER.to_string(),
        }
    }
}
