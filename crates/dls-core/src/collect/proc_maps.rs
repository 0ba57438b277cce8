//! Parser for `/proc/<pid>/maps` lines (Linux-only).
//!
//! A fully populated line has seven whitespace-separated fields:
//!
//! ```text
//! 7f0000000000-7f0000021000 r-xp 00000000 08:01 131 /lib/libfoo.so.1 (deleted)
//! address                   perms offset  dev   inode path            annotation
//! ```
//!
//! Anonymous mappings lack the path and most file-backed mappings lack the
//! annotation; neither is interesting here.

/// Field count of a mapping line that carries both a path and an annotation.
pub const MAPS_FIELD_COUNT: usize = 7;

const PATH_FIELD: usize = 5;
const ANNOTATION_FIELD: usize = 6;

/// Path and annotation of one fully populated mapping line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRecord<'a> {
    pub path: &'a str,
    pub annotation: &'a str,
}

impl<'a> MappingRecord<'a> {
    /// Build a record from pre-split fields.
    ///
    /// Returns `None` unless exactly [`MAPS_FIELD_COUNT`] fields are given.
    /// Paths containing whitespace split into extra fields and are skipped
    /// as well.
    pub fn from_fields(fields: &[&'a str]) -> Option<Self> {
        if fields.len() != MAPS_FIELD_COUNT {
            return None;
        }
        Some(Self {
            path: fields[PATH_FIELD],
            annotation: fields[ANNOTATION_FIELD],
        })
    }

    /// Whether the path looks like a shared library and the kernel marked
    /// its backing file as removed.
    pub fn is_deleted_library(&self, library_marker: &str, deletion_marker: &str) -> bool {
        self.path.contains(library_marker) && self.annotation.contains(deletion_marker)
    }
}

/// Split a maps line on runs of whitespace.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
