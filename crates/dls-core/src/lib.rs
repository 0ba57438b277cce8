//! Deleted-library scanner core.
//!
//! Walks `/proc/<pid>/maps`, finds shared libraries that are still mapped
//! after their files were deleted, and reports how many processes hold each
//! one.

pub mod cli;
pub mod collect;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod metrics;
pub mod scan;

pub use config::ScanConfig;
pub use exit_codes::ExitCode;
pub use scan::{
    classify_mapping_record, derive_library_process_counts, scan_all_processes,
    LibraryProcessCounts, PerProcessCounts, ProcessLibraryCounts, ScanOutcome, ScanReport,
};
