//! Diagnostics — Type-system error reporting.
//!
//! This module provides diagnostic types for malformed declarations, merge
//! conflicts and structural errors in the global type model, plus the
//! findings of the validators in [`crate::ide::inspections`]. None of them
//! is fatal: a model with diagnostics stays fully queryable.

use std::sync::Arc;

use crate::base::{FileId, Location};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A diagnostic message attached to a declaration's provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub location: Location,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self::new(location, Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self::new(location, Severity::Warning, message)
    }

    fn new(location: Location, severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            severity,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Override the severity (inspections are configurable per check).
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, location: Location, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo {
            location,
            message: message.into(),
        });
        self
    }

    /// The file this diagnostic is reported in.
    #[inline]
    pub fn file(&self) -> FileId {
        self.location.file
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    /// Declaration could not be keyed (missing code or qualifier).
    pub const MALFORMED_DECLARATION: &str = "E0001";
    /// Same code declared with different kinds.
    pub const CONFLICTING_KIND: &str = "E0002";
    /// Parent type is unknown or not an item type.
    pub const UNRESOLVED_PARENT: &str = "E0003";
    /// Type takes part in an `extends` cycle.
    pub const CYCLIC_EXTENDS: &str = "E0004";
    /// Custom property names a qualifier that does not resolve.
    pub const UNRESOLVED_QUALIFIER: &str = "E0005";
    /// Modifier combination the platform rejects at build time.
    pub const INVALID_MODIFIERS: &str = "E0006";

    /// Attribute re-declared with a different value type.
    pub const INCOMPATIBLE_OVERRIDE: &str = "W0001";
    /// Second `extends` for the same type with a different parent.
    pub const CONFLICTING_PARENT: &str = "W0002";
    /// Naming convention violation.
    pub const NAMING_CONVENTION: &str = "W0003";
    /// Deprecated usage.
    pub const DEPRECATED: &str = "W0004";
    /// Pattern that works but performs badly.
    pub const DISCOURAGED: &str = "W0005";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during adaptation, merging and resolution.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Add a malformed-declaration error (parse-level defect).
    pub fn malformed(&mut self, location: Location, what: &str) {
        self.add(
            Diagnostic::error(location, format!("malformed declaration: {}", what))
                .with_code(codes::MALFORMED_DECLARATION),
        );
    }

    /// Add a conflicting-kind error for one offending declaration.
    pub fn conflicting_kind(
        &mut self,
        location: Location,
        code: &str,
        declared: &str,
        winner: &str,
        winner_location: Location,
    ) {
        self.add(
            Diagnostic::error(
                location,
                format!(
                    "'{}' is declared as {} here but as {} elsewhere; {} wins",
                    code, declared, winner, winner
                ),
            )
            .with_code(codes::CONFLICTING_KIND)
            .with_related(winner_location, format!("'{}' declared as {}", code, winner)),
        );
    }

    /// Add a conflicting-parent warning for a second `extends`.
    pub fn conflicting_parent(
        &mut self,
        location: Location,
        code: &str,
        parent: &str,
        previous: &str,
        previous_location: Location,
    ) {
        self.add(
            Diagnostic::warning(
                location,
                format!(
                    "'{}' extends '{}' here but '{}' elsewhere; '{}' wins",
                    code, parent, previous, parent
                ),
            )
            .with_code(codes::CONFLICTING_PARENT)
            .with_related(previous_location, format!("'{}' extends '{}'", code, previous)),
        );
    }

    /// Add an incompatible-override warning for a re-declared attribute.
    pub fn incompatible_override(
        &mut self,
        location: Location,
        qualifier: &str,
        declared: &str,
        overridden: &str,
        overridden_location: Location,
    ) {
        self.add(
            Diagnostic::warning(
                location,
                format!(
                    "attribute '{}' is redeclared as '{}' but was '{}'",
                    qualifier, declared, overridden
                ),
            )
            .with_code(codes::INCOMPATIBLE_OVERRIDE)
            .with_related(overridden_location, format!("'{}' declared as '{}'", qualifier, overridden)),
        );
    }

    /// Add an unresolved-parent error.
    pub fn unresolved_parent(&mut self, location: Location, code: &str, parent: &str) {
        self.add(
            Diagnostic::error(
                location,
                format!("'{}' extends unknown item type '{}'", code, parent),
            )
            .with_code(codes::UNRESOLVED_PARENT),
        );
    }

    /// Add a cyclic-extends error.
    pub fn cyclic_extends(&mut self, location: Location, code: &str, cycle: &[&str]) {
        self.add(
            Diagnostic::error(
                location,
                format!("'{}' is part of an extends cycle: {}", code, cycle.join(" -> ")),
            )
            .with_code(codes::CYCLIC_EXTENDS),
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
