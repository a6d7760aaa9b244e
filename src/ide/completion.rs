//! Completion — type codes, members and subtypes from the model.
//!
//! All functions read one [`GlobalTypeModel`] generation and never block on
//! a rebuild.

use smol_str::SmolStr;

use crate::decl::TypeKind;
use crate::meta::{Classifier, GlobalTypeModel, NodeRef, ItemType};

/// What a completion item stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Type(TypeKind),
    Attribute,
    RelationEnd,
    EnumValue,
    /// Key or value slot of a map type.
    MapEntry,
}

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: SmolStr,
    pub kind: CompletionKind,
    /// Short type text shown next to the label
    pub detail: Option<SmolStr>,
}

impl CompletionItem {
    fn new(label: impl Into<SmolStr>, kind: CompletionKind, detail: Option<SmolStr>) -> Self {
        Self {
            label: label.into(),
            kind,
            detail,
        }
    }
}

/// Codes of every classifier of the requested kinds, in code table order.
pub fn type_code_completions(model: &GlobalTypeModel, kinds: &[TypeKind]) -> Vec<CompletionItem> {
    let access = model.access();
    kinds
        .iter()
        .flat_map(|&kind| access.all_of_kind(kind))
        .map(|classifier| {
            CompletionItem::new(
                classifier.code(),
                CompletionKind::Type(classifier.kind()),
                None,
            )
        })
        .collect()
}

/// Members reachable on `type_code`.
///
/// Collection types complete with the members of their element type, up to
/// `max_completion_depth` collection hops.
pub fn member_completions(model: &GlobalTypeModel, type_code: &str) -> Vec<CompletionItem> {
    members(model, type_code, 0)
}

fn members(model: &GlobalTypeModel, type_code: &str, depth: usize) -> Vec<CompletionItem> {
    if depth > model.config().max_completion_depth {
        return Vec::new();
    }
    match model.access().find_classifier_by_code(type_code) {
        Some(Classifier::Item(item)) => item_members(item),
        Some(Classifier::Enum(enumeration)) => enumeration
            .data
            .values
            .values()
            .map(|value| {
                CompletionItem::new(
                    value.code.clone(),
                    CompletionKind::EnumValue,
                    Some(SmolStr::new(enumeration.code())),
                )
            })
            .collect(),
        Some(Classifier::Relation(relation)) => [&relation.data.source, &relation.data.target]
            .into_iter()
            .filter_map(|end| {
                let qualifier = end.qualifier.clone()?;
                Some(CompletionItem::new(
                    qualifier,
                    CompletionKind::RelationEnd,
                    Some(end.type_code.clone()),
                ))
            })
            .collect(),
        Some(Classifier::Collection(collection)) => {
            members(model, &collection.data.element_type, depth + 1)
        }
        Some(Classifier::Map(map)) => vec![
            CompletionItem::new("key", CompletionKind::MapEntry, Some(map.data.argument_type.clone())),
            CompletionItem::new("value", CompletionKind::MapEntry, Some(map.data.return_type.clone())),
        ],
        None => Vec::new(),
    }
}

fn item_members(item: NodeRef<'_, ItemType>) -> Vec<CompletionItem> {
    let Some(hierarchy) = item.hierarchy() else {
        return Vec::new();
    };
    let attributes = hierarchy.all_attributes.values().map(|attribute| {
        CompletionItem::new(
            attribute.qualifier.clone(),
            CompletionKind::Attribute,
            Some(attribute.type_ref.clone()),
        )
    });
    let relation_ends = hierarchy.all_relation_ends.iter().filter_map(|end| {
        let qualifier = end.qualifier.clone()?;
        Some(CompletionItem::new(
            qualifier,
            CompletionKind::RelationEnd,
            Some(end.type_code.clone()),
        ))
    });
    attributes.chain(relation_ends).collect()
}

/// Every transitive subtype of `type_code`.
pub fn subtype_completions(model: &GlobalTypeModel, type_code: &str) -> Vec<CompletionItem> {
    let detail = SmolStr::new(format!("child of {}", type_code));
    model
        .access()
        .descendants(type_code)
        .into_iter()
        .map(|item| CompletionItem::new(item.code(), CompletionKind::Type(TypeKind::Item), Some(detail.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{FileId, ModuleId};
    use crate::config::ModelConfig;
    use crate::decl::{adapt_file, Cardinality, CollectionKind, RawAttribute, RawDeclaration, RawRelationEnd};

    fn model(config: ModelConfig) -> GlobalTypeModel {
        let raw = vec![
            RawDeclaration::item("Product", None)
                .with_attribute(RawAttribute::new("code", "java.lang.String")),
            RawDeclaration::item("VariantProduct", Some("Product"))
                .with_attribute(RawAttribute::new("baseProduct", "Product")),
            RawDeclaration::item("Keyword", None),
            RawDeclaration::relation(
                "Product2Keywords",
                RawRelationEnd::new("Product", "products", Cardinality::Many),
                RawRelationEnd::new("Keyword", "keywords", Cardinality::Many),
            ),
            RawDeclaration::enumeration("Status", &["CHECK", "APPROVED"]),
            RawDeclaration::collection("ProductCollection", "VariantProduct", CollectionKind::Collection),
            RawDeclaration::collection("ProductCollections", "ProductCollection", CollectionKind::List),
            RawDeclaration::map("LocalizedString", "Language", "java.lang.String"),
        ];
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        GlobalTypeModel::from_groups(&[group], config)
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn test_type_codes_by_kind() {
        let model = model(ModelConfig::default());
        let items = type_code_completions(&model, &[TypeKind::Enum, TypeKind::Map]);
        assert_eq!(labels(&items), ["Status", "LocalizedString"]);
        assert_eq!(items[0].kind, CompletionKind::Type(TypeKind::Enum));
    }

    #[test]
    fn test_item_members_include_inherited_and_relation_ends() {
        let model = model(ModelConfig::default());
        let items = member_completions(&model, "VariantProduct");
        assert_eq!(labels(&items), ["code", "baseProduct", "keywords"]);
        assert_eq!(items[2].detail.as_deref(), Some("Keyword"));
    }

    #[test]
    fn test_other_kinds() {
        let model = model(ModelConfig::default());
        assert_eq!(labels(&member_completions(&model, "Status")), ["CHECK", "APPROVED"]);
        assert_eq!(labels(&member_completions(&model, "Product2Keywords")), ["products", "keywords"]);
        assert_eq!(labels(&member_completions(&model, "LocalizedString")), ["key", "value"]);
        assert!(member_completions(&model, "Unknown").is_empty());
    }

    #[test]
    fn test_collection_recursion_is_bounded() {
        let model = model(ModelConfig::default());
        assert_eq!(member_completions(&model, "ProductCollections").len(), 3);

        let shallow = model_with_depth(1);
        assert!(member_completions(&shallow, "ProductCollections").is_empty());
        assert_eq!(member_completions(&shallow, "ProductCollection").len(), 3);
    }

    fn model_with_depth(depth: usize) -> GlobalTypeModel {
        model(ModelConfig::default().with_max_completion_depth(depth))
    }

    #[test]
    fn test_subtypes() {
        let model = model(ModelConfig::default());
        let items = subtype_completions(&model, "Product");
        assert_eq!(labels(&items), ["VariantProduct"]);
        assert_eq!(items[0].detail.as_deref(), Some("child of Product"));
    }
}
