//! Deleted-library scanner common types, IDs, and errors.
//!
//! This crate provides foundational types shared across dls-core modules:
//! - Process and library identity types
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use id::{LibraryPath, ProcessId};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
