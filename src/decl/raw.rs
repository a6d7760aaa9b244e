//! Raw declaration records as handed over by an external parser.
//!
//! Every field except the declaration kind may be missing: the parser
//! reports what it could read and the adapter decides what is usable.

use std::collections::BTreeMap;

use super::types::{Cardinality, CollectionKind, PersistenceKind, TypeKind};

/// Optional `(start, end)` byte offsets of a parsed element.
pub type RawRange = Option<(u32, u32)>;

/// All declarations parsed from one source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawFile {
    pub path: String,
    /// Name of the module (extension) owning the file.
    pub module: String,
    /// Project-specific module as opposed to a platform one.
    pub custom: bool,
    pub declarations: Vec<RawDeclaration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawDeclaration {
    pub kind: TypeKind,
    pub code: Option<String>,
    pub parent: Option<String>,
    pub attributes: Vec<RawAttribute>,
    pub indexes: Vec<RawIndex>,
    pub values: Vec<RawEnumValue>,
    pub dynamic: Option<bool>,
    pub source: Option<RawRelationEnd>,
    pub target: Option<RawRelationEnd>,
    pub element_type: Option<String>,
    pub collection_kind: Option<CollectionKind>,
    pub argument_type: Option<String>,
    pub return_type: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub range: RawRange,
}

impl Default for RawDeclaration {
    fn default() -> Self {
        Self::new(TypeKind::Item)
    }
}

impl RawDeclaration {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            code: None,
            parent: None,
            attributes: Vec::new(),
            indexes: Vec::new(),
            values: Vec::new(),
            dynamic: None,
            source: None,
            target: None,
            element_type: None,
            collection_kind: None,
            argument_type: None,
            return_type: None,
            custom_properties: BTreeMap::new(),
            range: None,
        }
    }

    /// Convenience constructor for an item type.
    pub fn item(code: &str, parent: Option<&str>) -> Self {
        Self {
            code: Some(code.to_string()),
            parent: parent.map(str::to_string),
            ..Self::new(TypeKind::Item)
        }
    }

    /// Convenience constructor for an enum type.
    pub fn enumeration(code: &str, values: &[&str]) -> Self {
        Self {
            code: Some(code.to_string()),
            values: values
                .iter()
                .map(|value| RawEnumValue {
                    code: Some(value.to_string()),
                    range: None,
                })
                .collect(),
            ..Self::new(TypeKind::Enum)
        }
    }

    /// Convenience constructor for a relation.
    pub fn relation(code: &str, source: RawRelationEnd, target: RawRelationEnd) -> Self {
        Self {
            code: Some(code.to_string()),
            source: Some(source),
            target: Some(target),
            ..Self::new(TypeKind::Relation)
        }
    }

    /// Convenience constructor for a collection type.
    pub fn collection(code: &str, element_type: &str, kind: CollectionKind) -> Self {
        Self {
            code: Some(code.to_string()),
            element_type: Some(element_type.to_string()),
            collection_kind: Some(kind),
            ..Self::new(TypeKind::Collection)
        }
    }

    /// Convenience constructor for a map type.
    pub fn map(code: &str, argument_type: &str, return_type: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            argument_type: Some(argument_type.to_string()),
            return_type: Some(return_type.to_string()),
            ..Self::new(TypeKind::Map)
        }
    }

    pub fn with_attribute(mut self, attribute: RawAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.custom_properties.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawAttribute {
    pub qualifier: Option<String>,
    /// May carry a `localized:` prefix.
    pub type_ref: Option<String>,
    pub persistence: Option<PersistenceKind>,
    pub modifiers: RawModifiers,
    pub handler: Option<String>,
    pub default_value: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub range: RawRange,
}

impl RawAttribute {
    pub fn new(qualifier: &str, type_ref: &str) -> Self {
        Self {
            qualifier: Some(qualifier.to_string()),
            type_ref: Some(type_ref.to_string()),
            ..Self::default()
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.modifiers.unique = Some(unique);
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.modifiers.optional = Some(optional);
        self
    }

    pub fn persistence(mut self, persistence: PersistenceKind) -> Self {
        self.persistence = Some(persistence);
        self
    }
}

/// Modifier flags; `None` means "not written", i.e. the platform default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawModifiers {
    pub read: Option<bool>,
    pub write: Option<bool>,
    pub search: Option<bool>,
    pub optional: Option<bool>,
    pub unique: Option<bool>,
    pub initial: Option<bool>,
    pub private: Option<bool>,
    pub removable: Option<bool>,
    pub part_of: Option<bool>,
    pub encrypted: Option<bool>,
    pub localized: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawIndex {
    pub name: Option<String>,
    pub keys: Vec<String>,
    pub unique: Option<bool>,
    pub range: RawRange,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawEnumValue {
    pub code: Option<String>,
    pub range: RawRange,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct RawRelationEnd {
    pub type_code: Option<String>,
    pub qualifier: Option<String>,
    pub cardinality: Option<Cardinality>,
    pub ordering: Vec<String>,
    pub collection_kind: Option<CollectionKind>,
    pub navigable: Option<bool>,
    pub modifiers: RawModifiers,
    pub range: RawRange,
}

impl RawRelationEnd {
    pub fn new(type_code: &str, qualifier: &str, cardinality: Cardinality) -> Self {
        Self {
            type_code: Some(type_code.to_string()),
            qualifier: Some(qualifier.to_string()),
            cardinality: Some(cardinality),
            ..Self::default()
        }
    }

    pub fn with_collection_kind(mut self, kind: CollectionKind) -> Self {
        self.collection_kind = Some(kind);
        self
    }
}
