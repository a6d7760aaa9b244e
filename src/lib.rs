//! # typesys-base
//!
//! Global type model for commerce type-system declarations: one merged,
//! inheritance-resolved view of every item, enum, relation, collection and
//! map type declared across a project's modules.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → Inspections, completion, model rendering
//!   ↓
//! state   → TypeSystemHost: revisions, rebuilds, published generations
//!   ↓
//! meta    → Model builder, inheritance resolver, query facade
//!   ↓
//! decl    → Raw records → local declarations (source adapter)
//!   ↓
//! base    → Primitives (FileId, ModuleId, Location)
//! ```
//!
//! `project` (feature `interchange`) loads JSON declaration batches from disk.

/// Foundation types: FileId, ModuleId, Location
pub mod base;

/// Tunables shared by every generation of a host
pub mod config;

/// Local declarations and the source set they come from
pub mod decl;

pub mod error;

/// IDE features: inspections, completion, model rendering
pub mod ide;

/// The global type model and its query facade
pub mod meta;

/// Invalidation and cache control
pub mod state;

#[cfg(feature = "interchange")]
pub mod project;

pub use base::{FileId, Location, ModuleId, TextRange, TextSize};
pub use config::{MergeOrder, ModelConfig};
pub use error::{LoadError, RebuildError};
pub use meta::{Classifier, Diagnostic, GlobalTypeModel, TypeAccess, TypeId};
pub use state::{RebuildOutcome, TypeSystemHost};
