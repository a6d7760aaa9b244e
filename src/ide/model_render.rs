//! Model renderer — which fields of a runtime model object the type system
//! knows about.
//!
//! A debugger hands over the runtime class name (`...model.ProductModel`)
//! and the object's field names; the renderer maps the class back to its
//! item type and keeps the fields backed by a readable attribute or a
//! navigable, readable relation end.

use smol_str::SmolStr;

use crate::meta::{Attribute, GlobalTypeModel, RelationEnd};

const MODEL_SUFFIX: &str = "Model";

/// What backs one rendered field.
#[derive(Debug, Clone, Copy)]
pub enum RenderedMember<'m> {
    Attribute(&'m Attribute),
    RelationEnd(&'m RelationEnd),
}

impl RenderedMember<'_> {
    /// Value type code of the member.
    pub fn type_code(&self) -> &str {
        match self {
            RenderedMember::Attribute(attribute) => &attribute.type_ref,
            RenderedMember::RelationEnd(end) => &end.type_code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedField<'m> {
    /// Field name as found on the object.
    pub name: SmolStr,
    pub member: RenderedMember<'m>,
}

/// `de.hybris.platform.core.model.product.ProductModel` → `Product`.
pub fn type_code_for_class(class_name: &str) -> &str {
    let simple = class_name.rsplit('.').next().unwrap_or(class_name);
    let simple = simple.rsplit('$').next().unwrap_or(simple);
    simple.strip_suffix(MODEL_SUFFIX).unwrap_or(simple)
}

/// Fields of an instance of `class_name` that map to model members, sorted
/// by name. Unknown classes render nothing.
pub fn render_fields<'m, S: AsRef<str>>(
    model: &'m GlobalTypeModel,
    class_name: &str,
    field_names: &[S],
) -> Vec<RenderedField<'m>> {
    let code = type_code_for_class(class_name);
    let Some(hierarchy) = model.access().hierarchy(code) else {
        tracing::debug!(class = class_name, code, "no item type for runtime class");
        return Vec::new();
    };

    let mut fields = Vec::new();
    for name in field_names {
        let name: &str = name.as_ref();
        if name.starts_with('_') {
            continue;
        }
        let attribute = hierarchy
            .all_attributes
            .get(name)
            .filter(|attribute| attribute.modifiers.read)
            .map(|attribute| RenderedMember::Attribute(attribute.as_ref()));
        let member = attribute.or_else(|| {
            hierarchy
                .all_relation_ends
                .iter()
                .filter(|end| end.navigable && end.modifiers.read)
                .find(|end| {
                    end.qualifier
                        .as_deref()
                        .is_some_and(|qualifier| qualifier.eq_ignore_ascii_case(name))
                })
                .map(|end| RenderedMember::RelationEnd(end.as_ref()))
        });
        if let Some(member) = member {
            fields.push(RenderedField {
                name: SmolStr::new(name),
                member,
            });
        }
    }
    fields.sort_by(|a, b| a.name.cmp(&b.name));
    fields
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{FileId, ModuleId};
    use crate::config::ModelConfig;
    use crate::decl::{adapt_file, Cardinality, RawAttribute, RawDeclaration, RawRelationEnd};

    #[test]
    fn test_type_code_for_class() {
        assert_eq!(type_code_for_class("de.hybris.platform.core.model.product.ProductModel"), "Product");
        assert_eq!(type_code_for_class("ProductModel"), "Product");
        assert_eq!(type_code_for_class("com.acme.Outer$InnerModel"), "Inner");
        assert_eq!(type_code_for_class("com.acme.Product"), "Product");
    }

    #[test]
    fn test_render_fields() {
        let mut hidden = RawAttribute::new("secret", "java.lang.String");
        hidden.modifiers.read = Some(false);
        let raw = vec![
            RawDeclaration::item("Product", None)
                .with_attribute(RawAttribute::new("name", "java.lang.String"))
                .with_attribute(RawAttribute::new("code", "java.lang.String"))
                .with_attribute(hidden),
            RawDeclaration::item("Keyword", None),
            RawDeclaration::relation(
                "Product2Keywords",
                RawRelationEnd::new("Product", "products", Cardinality::Many),
                RawRelationEnd::new("Keyword", "keywords", Cardinality::Many),
            ),
        ];
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        let model = GlobalTypeModel::from_groups(&[group], ModelConfig::default());

        let fields = render_fields(
            &model,
            "de.hybris.platform.core.model.product.ProductModel",
            &["name", "_pk", "secret", "KEYWORDS", "unknown", "code"],
        );
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["KEYWORDS", "code", "name"]);
        assert_eq!(fields[0].member.type_code(), "Keyword");

        assert!(render_fields(&model, "com.acme.UnknownModel", &["code"]).is_empty());
    }

    #[test]
    fn test_unreadable_end_does_not_hide_readable_one() {
        let mut hidden = RawRelationEnd::new("Tag", "tags", Cardinality::Many);
        hidden.modifiers.read = Some(false);
        let raw = vec![
            RawDeclaration::item("Product", None),
            RawDeclaration::item("Tag", None),
            RawDeclaration::item("Label", None),
            RawDeclaration::relation(
                "Product2Tags",
                RawRelationEnd::new("Product", "taggedProducts", Cardinality::Many),
                hidden,
            ),
            RawDeclaration::relation(
                "Product2Labels",
                RawRelationEnd::new("Product", "labelledProducts", Cardinality::Many),
                RawRelationEnd::new("Label", "tags", Cardinality::Many),
            ),
        ];
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        let model = GlobalTypeModel::from_groups(&[group], ModelConfig::default());

        let fields = render_fields(&model, "ProductModel", &["tags"]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].member.type_code(), "Label");
    }
}
