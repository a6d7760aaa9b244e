//! Error types.
//!
//! Bad declarations never surface here: they become
//! [`Diagnostic`](crate::meta::Diagnostic)s on the model. These errors cover
//! the few operations that can genuinely fail.

use std::path::PathBuf;

use thiserror::Error;

/// Why a rebuild produced no generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RebuildError {
    /// A newer change arrived while building; the partial result was dropped.
    #[error("rebuild superseded by a newer declaration change")]
    Superseded,
}

/// Failure while loading declaration batches from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "interchange")]
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load {} file(s):\n  {}", .0.len(), join_errors(.0))]
    Many(Vec<LoadError>),
}

fn join_errors(errors: &[LoadError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}
