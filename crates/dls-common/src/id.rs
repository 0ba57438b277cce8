//! Process and library identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// Parse a `/proc` directory entry name. Non-numeric entries such as
    /// `self` or `sys` are not processes.
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok().map(ProcessId)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path of a mapped shared library exactly as the kernel reports it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryPath(pub String);

impl LibraryPath {
    /// Split into `(directory, basename)`.
    ///
    /// The directory loses its trailing slashes unless it consists only of
    /// slashes, so `/libfoo.so` splits into `("/", "libfoo.so")` and
    /// `/lib//libfoo.so` into `("/lib", "libfoo.so")`.
    pub fn split(&self) -> (&str, &str) {
        let cut = self.0.rfind('/').map_or(0, |i| i + 1);
        let (head, tail) = self.0.split_at(cut);
        let trimmed = head.trim_end_matches('/');
        if trimmed.is_empty() {
            (head, tail)
        } else {
            (trimmed, tail)
        }
    }

    /// Directory component, used as the `library_path` label.
    pub fn directory(&self) -> &str {
        self.split().0
    }

    /// Base filename, used as the `library_name` label.
    pub fn file_name(&self) -> &str {
        self.split().1
    }
}

impl fmt::Display for LibraryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LibraryPath {
    fn from(path: &str) -> Self {
        LibraryPath(path.to_string())
    }
}
