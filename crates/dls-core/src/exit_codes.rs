//! Exit codes for the dls-core CLI.
//!
//! Exit codes communicate the run outcome without requiring output parsing.

use dls_common::Error;

/// Exit codes for dls-core runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Scan completed and the document was written
    Clean = 0,

    /// Configuration error
    ConfigError = 10,

    /// Collection/scan error
    CollectionError = 11,

    /// I/O error
    IoError = 13,

    /// Metrics rendering error
    RenderError = 14,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Pick the exit code for a fatal error.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::Collection(_)
            | Error::AccessFailed { .. }
            | Error::ReadFailed { .. }
            | Error::Decode { .. } => ExitCode::CollectionError,
            Error::Io(_) => ExitCode::IoError,
            Error::Metrics(_) | Error::Json(_) => ExitCode::RenderError,
        }
    }
}
