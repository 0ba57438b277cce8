//! Process-table collection.
//!
//! - [`source`]: where the per-process mapping files come from
//! - [`proc_maps`]: parsing of individual `/proc/<pid>/maps` lines

pub mod proc_maps;
pub mod source;

pub use proc_maps::{split_fields, MappingRecord, MAPS_FIELD_COUNT};
pub use source::{MapsOpenError, ProcFs, ProcSource, ProcessHandle};
