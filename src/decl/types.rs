//! Local declarations: one type's (possibly partial) definition as authored
//! in one module.
//!
//! These are the normalized output of the [adapter](super::adapt_file) and
//! the only input of the [model builder](crate::meta::build_model). They are
//! immutable once produced; an edit to a file replaces the file's whole
//! [`DeclarationGroup`].

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{FileId, Location, ModuleId};
use crate::meta::Diagnostic;

/// Custom key/value annotations, in declaration order.
pub type CustomProperties = IndexMap<SmolStr, SmolStr>;

// ============================================================================
// KINDS
// ============================================================================

/// The five classifier categories of the type system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "snake_case"))]
pub enum TypeKind {
    Item,
    Enum,
    Relation,
    Collection,
    Map,
}

impl TypeKind {
    pub const ALL: [TypeKind; 5] = [
        TypeKind::Item,
        TypeKind::Enum,
        TypeKind::Relation,
        TypeKind::Collection,
        TypeKind::Map,
    ];

    /// Human-readable name for messages.
    pub fn display(&self) -> &'static str {
        match self {
            TypeKind::Item => "item type",
            TypeKind::Enum => "enum type",
            TypeKind::Relation => "relation",
            TypeKind::Collection => "collection type",
            TypeKind::Map => "map type",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// How an attribute's value is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "snake_case"))]
pub enum PersistenceKind {
    #[default]
    Property,
    Dynamic,
    Jalo,
}

/// Cardinality of one relation end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "snake_case"))]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

/// Container flavour of a collection type or a MANY relation end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "snake_case"))]
pub enum CollectionKind {
    #[default]
    Collection,
    Set,
    List,
}

// ============================================================================
// MODIFIERS
// ============================================================================

/// Attribute and relation-end modifiers.
///
/// Defaults follow the platform: readable, writable, searchable and
/// optional unless stated otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub read: bool,
    pub write: bool,
    pub search: bool,
    pub optional: bool,
    pub unique: bool,
    /// Value is required at creation time.
    pub initial: bool,
    pub private: bool,
    pub removable: bool,
    pub part_of: bool,
    pub encrypted: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
            search: true,
            optional: true,
            unique: false,
            initial: false,
            private: false,
            removable: true,
            part_of: false,
            encrypted: false,
        }
    }
}

impl Modifiers {
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read && !self.write
    }
}

// ============================================================================
// DECLARATION PARTS
// ============================================================================

/// Where a declaration came from: owning module and source location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub module: ModuleId,
    pub location: Location,
}

impl Provenance {
    #[inline]
    pub fn file(&self) -> FileId {
        self.location.file
    }
}

/// One attribute as declared on an item type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalAttribute {
    pub qualifier: SmolStr,
    /// Value type code, `localized:` prefix already stripped. Empty when the
    /// declaration did not say.
    pub type_ref: SmolStr,
    pub localized: bool,
    pub persistence: PersistenceKind,
    pub modifiers: Modifiers,
    /// Custom attribute handler (bean id) for dynamic attributes.
    pub handler: Option<SmolStr>,
    pub default_value: Option<SmolStr>,
    pub custom_properties: CustomProperties,
    pub location: Location,
}

/// A database index over attribute qualifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalIndex {
    pub name: SmolStr,
    pub keys: Vec<SmolStr>,
    pub unique: bool,
    pub location: Location,
}

/// One end of a relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationEndDecl {
    /// Item type bound to this end. Empty when the declaration did not say.
    pub type_code: SmolStr,
    /// Name under which this end is reachable from the opposite type.
    pub qualifier: Option<SmolStr>,
    pub cardinality: Cardinality,
    pub ordering: Vec<SmolStr>,
    /// Only meaningful for [`Cardinality::Many`].
    pub collection_kind: Option<CollectionKind>,
    pub navigable: bool,
    pub modifiers: Modifiers,
    pub location: Location,
}

/// One enumeration literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValueDecl {
    pub code: SmolStr,
    pub location: Location,
}

/// Kind-specific content of a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclBody {
    Item {
        parent: Option<SmolStr>,
        attributes: Vec<LocalAttribute>,
        indexes: Vec<LocalIndex>,
    },
    Enum {
        values: Vec<EnumValueDecl>,
        dynamic: bool,
    },
    Relation {
        source: RelationEndDecl,
        target: RelationEndDecl,
    },
    Collection {
        element_type: SmolStr,
        collection_kind: CollectionKind,
    },
    Map {
        argument_type: SmolStr,
        return_type: SmolStr,
    },
}

impl DeclBody {
    pub fn kind(&self) -> TypeKind {
        match self {
            DeclBody::Item { .. } => TypeKind::Item,
            DeclBody::Enum { .. } => TypeKind::Enum,
            DeclBody::Relation { .. } => TypeKind::Relation,
            DeclBody::Collection { .. } => TypeKind::Collection,
            DeclBody::Map { .. } => TypeKind::Map,
        }
    }
}

/// One type's declaration in one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalDeclaration {
    pub code: SmolStr,
    pub body: DeclBody,
    pub custom_properties: CustomProperties,
    pub provenance: Provenance,
}

impl LocalDeclaration {
    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.body.kind()
    }

    /// Declared parent code (item types only).
    pub fn parent(&self) -> Option<&str> {
        match &self.body {
            DeclBody::Item { parent, .. } => parent.as_deref(),
            _ => None,
        }
    }

    /// Declared attributes (empty for non-item kinds).
    pub fn attributes(&self) -> &[LocalAttribute] {
        match &self.body {
            DeclBody::Item { attributes, .. } => attributes,
            _ => &[],
        }
    }
}

/// All declarations contributed by one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationGroup {
    pub file: FileId,
    pub module: ModuleId,
    pub declarations: Vec<LocalDeclaration>,
    /// Parse-level defects found while adapting this file.
    pub diagnostics: Vec<Diagnostic>,
}

impl DeclarationGroup {
    pub fn empty(file: FileId, module: ModuleId) -> Self {
        Self {
            file,
            module,
            declarations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_defaults() {
        let modifiers = Modifiers::default();
        assert!(modifiers.optional);
        assert!(!modifiers.unique);
        assert!(!modifiers.is_read_only());
    }

    #[test]
    fn test_body_kind() {
        let body = DeclBody::Enum {
            values: Vec::new(),
            dynamic: true,
        };
        assert_eq!(body.kind(), TypeKind::Enum);
        assert_eq!(body.kind().to_string(), "enum type");
    }
}
