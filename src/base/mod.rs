//! Foundation types for the type-system toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`], [`ModuleId`] - Source file and owning module identifiers
//! - [`Location`], [`TextRange`], [`TextSize`] - Source positions
//!
//! This module has NO dependencies on other typesys modules.

mod file_id;
mod span;

pub use file_id::{FileId, ModuleId};
pub use span::{Location, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
