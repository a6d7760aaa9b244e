//! Query/access facade — the read-only entry point consumers use.
//!
//! A [`TypeAccess`] borrows one generation, so every answer it gives is
//! consistent with every other answer from the same value. Unknown codes and
//! qualifiers produce `None` or an empty result.

use std::sync::Arc;

use crate::decl::TypeKind;

use super::ids::TypeId;
use super::model::GlobalTypeModel;
use super::node::{Attribute, Classifier, EnumValue, Hierarchy, ItemType, NodeRef, RelationEnd};

/// Read-only queries against one [`GlobalTypeModel`] generation.
#[derive(Clone, Copy, Debug)]
pub struct TypeAccess<'m> {
    model: &'m GlobalTypeModel,
}

impl<'m> TypeAccess<'m> {
    pub fn new(model: &'m GlobalTypeModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'m GlobalTypeModel {
        self.model
    }

    pub fn generation(&self) -> u64 {
        self.model.generation()
    }

    // ===== lookups =====

    /// Exact, case-sensitive lookup of an item type.
    ///
    /// Codes denoting another kind yield `None`; use
    /// [`find_classifier_by_code`](Self::find_classifier_by_code) when the
    /// kind is not known up front.
    pub fn find_type_by_code(&self, code: &str) -> Option<NodeRef<'m, ItemType>> {
        match self.find_classifier_by_code(code)? {
            Classifier::Item(item) => Some(item),
            _ => None,
        }
    }

    /// Exact lookup across all five kinds.
    pub fn find_classifier_by_code(&self, code: &str) -> Option<Classifier<'m>> {
        self.model.node_by_code(code).map(Classifier::of)
    }

    /// Attribute `qualifier` of item type `type_code`.
    ///
    /// With `include_inherited` the lookup covers ancestors, and an own
    /// declaration shadows an inherited one.
    pub fn find_attribute(
        &self,
        type_code: &str,
        qualifier: &str,
        include_inherited: bool,
    ) -> Option<&'m Attribute> {
        let item = self.find_type_by_code(type_code)?;
        let attribute = if include_inherited {
            match item.hierarchy() {
                Some(hierarchy) => hierarchy.all_attributes.get(qualifier),
                None => item.data.attributes.get(qualifier),
            }
        } else {
            item.data.attributes.get(qualifier)
        };
        attribute.map(Arc::as_ref)
    }

    /// Relation ends navigable from `type_code` under `qualifier`.
    ///
    /// Several relations may legally reuse a qualifier, so all matches are
    /// returned, ancestor ends first.
    pub fn find_relation_ends(
        &self,
        type_code: &str,
        qualifier: &str,
        include_inherited: bool,
    ) -> Vec<&'m RelationEnd> {
        self.relation_ends(type_code, include_inherited)
            .iter()
            .filter(|end| end.qualifier.as_deref() == Some(qualifier))
            .map(Arc::as_ref)
            .collect()
    }

    /// All relation ends navigable from `type_code`.
    pub fn relation_ends(&self, type_code: &str, include_inherited: bool) -> &'m [Arc<RelationEnd>] {
        let Some(hierarchy) = self.find_type_by_code(type_code).and_then(|item| item.hierarchy()) else {
            return &[];
        };
        if include_inherited {
            &hierarchy.all_relation_ends
        } else {
            &hierarchy.own_relation_ends
        }
    }

    /// Whether the member `qualifier` of `type_code` points at a catalog
    /// aware item type.
    ///
    /// The attribute's value type is checked first; failing an attribute,
    /// the type reached through a matching relation end.
    pub fn is_catalog_aware(&self, type_code: &str, qualifier: &str, include_inherited: bool) -> bool {
        if let Some(attribute) = self.find_attribute(type_code, qualifier, include_inherited) {
            return self.is_catalog_item_type(&attribute.type_ref);
        }
        self.find_relation_ends(type_code, qualifier, include_inherited)
            .iter()
            .any(|end| self.is_catalog_item_type(&end.type_code))
    }

    /// Whether `code` is an item type whose merged custom properties carry a
    /// truthy catalog-aware marker.
    pub fn is_catalog_item_type(&self, code: &str) -> bool {
        let marker = self.model.config().catalog_aware_marker.as_str();
        self.find_type_by_code(code)
            .and_then(|item| item.hierarchy())
            .and_then(|hierarchy| hierarchy.all_custom_properties.get(marker))
            .is_some_and(|value| is_truthy(value))
    }

    // ===== helpers =====

    pub fn hierarchy(&self, type_code: &str) -> Option<&'m Hierarchy> {
        self.find_type_by_code(type_code)?.hierarchy()
    }

    /// Own and inherited attributes, in resolution order.
    pub fn all_attributes(&self, type_code: &str) -> Vec<&'m Attribute> {
        self.hierarchy(type_code)
            .map(|h| h.all_attributes.values().map(Arc::as_ref).collect())
            .unwrap_or_default()
    }

    /// Ancestor chain, root first, ending with the type itself.
    pub fn ancestors(&self, type_code: &str) -> Vec<NodeRef<'m, ItemType>> {
        self.hierarchy(type_code)
            .map(|h| self.items(&h.ancestors))
            .unwrap_or_default()
    }

    /// All transitive subtypes.
    pub fn descendants(&self, type_code: &str) -> Vec<NodeRef<'m, ItemType>> {
        self.model
            .id_of(type_code)
            .map(|id| self.items(&self.model.descendants(id)))
            .unwrap_or_default()
    }

    pub fn enum_values(&self, code: &str) -> Vec<&'m EnumValue> {
        match self.find_classifier_by_code(code) {
            Some(Classifier::Enum(enumeration)) => enumeration.data.values.values().collect(),
            _ => Vec::new(),
        }
    }

    /// Every classifier of one kind, in code table order.
    pub fn all_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = Classifier<'m>> + 'm {
        self.model.nodes_of_kind(kind).map(Classifier::of)
    }

    fn items(&self, ids: &[TypeId]) -> Vec<NodeRef<'m, ItemType>> {
        ids.iter()
            .filter_map(|&id| self.model.node(id))
            .filter_map(|node| match Classifier::of(node) {
                Classifier::Item(item) => Some(item),
                _ => None,
            })
            .collect()
    }
}

/// Strip whitespace and one pair of surrounding double quotes from a
/// custom property value. Empty values yield `None`.
pub fn property_string(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    (!unquoted.is_empty()).then_some(unquoted)
}

/// `true`, `"true"`, `Boolean.TRUE` and `java.lang.Boolean.TRUE`, any case.
pub fn is_truthy(value: &str) -> bool {
    let Some(value) = property_string(value) else {
        return false;
    };
    let value = value.to_ascii_lowercase();
    value == "true" || value == "boolean.true" || value.ends_with(".boolean.true")
}
