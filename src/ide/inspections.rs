//! Inspections — validators over one file's declarations.
//!
//! Each [`Check`] looks at the [`LocalDeclaration`]s of a single
//! [`DeclarationGroup`], consulting the current model where a rule depends
//! on merged or inherited data (collection types, catalog awareness,
//! unique members). Structural problems found while building the model are
//! appended by [`file_diagnostics`].

use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::Location;
use crate::decl::{
    Cardinality, CollectionKind, DeclBody, DeclarationGroup, LocalAttribute, LocalDeclaration,
    PersistenceKind, RelationEndDecl, TypeKind,
};
use crate::meta::{codes, property_string, Classifier, Diagnostic, GlobalTypeModel, Severity, TypeAccess};

/// One validation rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Check {
    QualifierMustStartWithLowercase,
    TypeNameMustNotStartWithGenerated,
    EnumValueMustBeUppercase,
    DynamicAttributeNeedsHandler,
    MandatoryAttributeNeedsInitialValue,
    JaloPersistenceIsDeprecated,
    CollectionsOnlyForDynamicAndJalo,
    ListsInRelationShouldBeAvoided,
    CatalogVersionQualifier,
    UniqueKeyQualifier,
}

impl Check {
    pub const ALL: [Check; 10] = [
        Check::QualifierMustStartWithLowercase,
        Check::TypeNameMustNotStartWithGenerated,
        Check::EnumValueMustBeUppercase,
        Check::DynamicAttributeNeedsHandler,
        Check::MandatoryAttributeNeedsInitialValue,
        Check::JaloPersistenceIsDeprecated,
        Check::CollectionsOnlyForDynamicAndJalo,
        Check::ListsInRelationShouldBeAvoided,
        Check::CatalogVersionQualifier,
        Check::UniqueKeyQualifier,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Check::QualifierMustStartWithLowercase
            | Check::TypeNameMustNotStartWithGenerated
            | Check::EnumValueMustBeUppercase => codes::NAMING_CONVENTION,
            Check::DynamicAttributeNeedsHandler
            | Check::MandatoryAttributeNeedsInitialValue
            | Check::CollectionsOnlyForDynamicAndJalo => codes::INVALID_MODIFIERS,
            Check::JaloPersistenceIsDeprecated => codes::DEPRECATED,
            Check::ListsInRelationShouldBeAvoided => codes::DISCOURAGED,
            Check::CatalogVersionQualifier | Check::UniqueKeyQualifier => codes::UNRESOLVED_QUALIFIER,
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Check::DynamicAttributeNeedsHandler
            | Check::MandatoryAttributeNeedsInitialValue
            | Check::CollectionsOnlyForDynamicAndJalo
            | Check::CatalogVersionQualifier
            | Check::UniqueKeyQualifier => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// Runs the enabled [`Check`]s against one model generation.
#[derive(Clone, Debug)]
pub struct TypeSystemChecker<'m> {
    access: TypeAccess<'m>,
    disabled: FxHashSet<Check>,
    severities: FxHashMap<Check, Severity>,
}

impl<'m> TypeSystemChecker<'m> {
    pub fn new(model: &'m GlobalTypeModel) -> Self {
        Self {
            access: model.access(),
            disabled: FxHashSet::default(),
            severities: FxHashMap::default(),
        }
    }

    pub fn without(mut self, check: Check) -> Self {
        self.disabled.insert(check);
        self
    }

    pub fn with_severity(mut self, check: Check, severity: Severity) -> Self {
        self.severities.insert(check, severity);
        self
    }

    pub fn is_enabled(&self, check: Check) -> bool {
        !self.disabled.contains(&check)
    }

    /// All findings for one file, in declaration order.
    pub fn check_group(&self, group: &DeclarationGroup) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for declaration in &group.declarations {
            self.check_declaration(declaration, &mut out);
        }
        tracing::trace!(file = group.file.0, findings = out.len(), "inspected file");
        out
    }

    fn check_declaration(&self, declaration: &LocalDeclaration, out: &mut Vec<Diagnostic>) {
        if matches!(
            declaration.kind(),
            TypeKind::Item | TypeKind::Enum | TypeKind::Relation
        ) && declaration.code.starts_with("Generated")
        {
            self.report(
                out,
                Check::TypeNameMustNotStartWithGenerated,
                declaration.provenance.location,
                format!("type code '{}' must not start with 'Generated'", declaration.code),
            );
        }

        match &declaration.body {
            DeclBody::Item { attributes, .. } => {
                for attribute in attributes {
                    self.check_attribute(attribute, out);
                }
                self.check_catalog_version_qualifier(declaration, out);
                self.check_unique_key_qualifiers(declaration, out);
            }
            DeclBody::Enum { values, .. } => {
                for value in values {
                    if !is_uppercase_literal(&value.code) {
                        self.report(
                            out,
                            Check::EnumValueMustBeUppercase,
                            value.location,
                            format!(
                                "value '{}' of enum '{}' should be upper case",
                                value.code, declaration.code
                            ),
                        );
                    }
                }
            }
            DeclBody::Relation { source, target } => {
                self.check_relation_end(source, out);
                self.check_relation_end(target, out);
            }
            DeclBody::Collection { .. } | DeclBody::Map { .. } => {}
        }
    }

    fn check_attribute(&self, attribute: &LocalAttribute, out: &mut Vec<Diagnostic>) {
        let qualifier = attribute.qualifier.as_str();
        let location = attribute.location;

        if !starts_lowercase(qualifier) {
            self.report(
                out,
                Check::QualifierMustStartWithLowercase,
                location,
                format!("qualifier '{}' must start with a lower-case letter", qualifier),
            );
        }

        if attribute.persistence == PersistenceKind::Dynamic && attribute.handler.is_none() {
            self.report(
                out,
                Check::DynamicAttributeNeedsHandler,
                location,
                format!("dynamic attribute '{}' has no attribute handler", qualifier),
            );
        }

        let modifiers = attribute.modifiers;
        if !modifiers.optional && !modifiers.initial && attribute.default_value.is_none() {
            self.report(
                out,
                Check::MandatoryAttributeNeedsInitialValue,
                location,
                format!(
                    "mandatory attribute '{}' must be initial or have a default value",
                    qualifier
                ),
            );
        }

        if attribute.persistence == PersistenceKind::Jalo {
            self.report(
                out,
                Check::JaloPersistenceIsDeprecated,
                location,
                format!("attribute '{}' uses deprecated jalo persistence", qualifier),
            );
        }

        if attribute.persistence == PersistenceKind::Property
            && matches!(
                self.access.find_classifier_by_code(&attribute.type_ref),
                Some(Classifier::Collection(_))
            )
        {
            self.report(
                out,
                Check::CollectionsOnlyForDynamicAndJalo,
                location,
                format!(
                    "collection-typed attribute '{}' must use dynamic or jalo persistence",
                    qualifier
                ),
            );
        }
    }

    fn check_relation_end(&self, end: &RelationEndDecl, out: &mut Vec<Diagnostic>) {
        if let Some(qualifier) = end.qualifier.as_deref() {
            if !starts_lowercase(qualifier) {
                self.report(
                    out,
                    Check::QualifierMustStartWithLowercase,
                    end.location,
                    format!("qualifier '{}' must start with a lower-case letter", qualifier),
                );
            }
        }

        if end.cardinality == Cardinality::Many && end.collection_kind == Some(CollectionKind::List) {
            self.report(
                out,
                Check::ListsInRelationShouldBeAvoided,
                end.location,
                format!(
                    "relation end '{}' is an ordered list; prefer a set or collection",
                    end.qualifier.as_deref().unwrap_or(&end.type_code)
                ),
            );
        }
    }

    fn check_catalog_version_qualifier(&self, declaration: &LocalDeclaration, out: &mut Vec<Diagnostic>) {
        let key = &self.access.model().config().catalog_version_qualifier_key;
        let Some(qualifier) = declaration
            .custom_properties
            .get(key)
            .and_then(|value| property_string(value))
        else {
            return;
        };
        if self.access.find_type_by_code(&declaration.code).is_none() {
            return;
        }
        if !self.access.is_catalog_aware(&declaration.code, qualifier, true) {
            self.report(
                out,
                Check::CatalogVersionQualifier,
                declaration.provenance.location,
                format!(
                    "'{}' of '{}' does not name a catalog aware attribute",
                    qualifier, declaration.code
                ),
            );
        }
    }

    fn check_unique_key_qualifiers(&self, declaration: &LocalDeclaration, out: &mut Vec<Diagnostic>) {
        let key = &self.access.model().config().unique_key_qualifier_key;
        let Some(value) = declaration
            .custom_properties
            .get(key)
            .and_then(|value| property_string(value))
        else {
            return;
        };
        if self.access.find_type_by_code(&declaration.code).is_none() {
            return;
        }

        let code = declaration.code.as_str();
        let not_unique: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|qualifier| !qualifier.is_empty())
            .filter(|qualifier| !self.is_unique_member(code, qualifier))
            .collect();
        if !not_unique.is_empty() {
            self.report(
                out,
                Check::UniqueKeyQualifier,
                declaration.provenance.location,
                format!(
                    "unique key of '{}' names non-unique members: {}",
                    code,
                    not_unique.join(", ")
                ),
            );
        }
    }

    fn is_unique_member(&self, type_code: &str, qualifier: &str) -> bool {
        let attribute = self
            .access
            .find_attribute(type_code, qualifier, true)
            .is_some_and(|attribute| attribute.is_unique());
        attribute
            || self
                .access
                .find_relation_ends(type_code, qualifier, true)
                .iter()
                .any(|end| end.modifiers.unique)
    }

    fn report(&self, out: &mut Vec<Diagnostic>, check: Check, location: Location, message: String) {
        if !self.is_enabled(check) {
            return;
        }
        let severity = self
            .severities
            .get(&check)
            .copied()
            .unwrap_or_else(|| check.default_severity());
        out.push(
            Diagnostic::warning(location, message)
                .with_severity(severity)
                .with_code(check.code()),
        );
    }
}

/// Inspection findings plus the model's own diagnostics for the file.
pub fn file_diagnostics(model: &GlobalTypeModel, group: &DeclarationGroup) -> Vec<Diagnostic> {
    let mut diagnostics = TypeSystemChecker::new(model).check_group(group);
    diagnostics.extend(model.diagnostics_for_file(group.file).cloned());
    diagnostics
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_none_or(char::is_lowercase)
}

/// Upper case once `_` and digits are ignored.
fn is_uppercase_literal(code: &str) -> bool {
    !code
        .chars()
        .filter(|c| *c != '_' && !c.is_ascii_digit())
        .any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{FileId, ModuleId};
    use crate::config::ModelConfig;
    use crate::decl::{adapt_file, RawAttribute, RawDeclaration, RawRelationEnd};

    fn inspect(raw: Vec<RawDeclaration>) -> Vec<Diagnostic> {
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        let model = GlobalTypeModel::from_groups(&[group.clone()], ModelConfig::default());
        TypeSystemChecker::new(&model).check_group(&group)
    }

    fn codes_of(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().filter_map(|d| d.code.as_deref()).collect()
    }

    #[test]
    fn test_naming_conventions() {
        let diagnostics = inspect(vec![
            RawDeclaration::item("GeneratedProduct", None)
                .with_attribute(RawAttribute::new("Name", "java.lang.String")),
            RawDeclaration::enumeration("Status", &["CHECK_1", "approved"]),
        ]);

        assert_eq!(diagnostics.len(), 3);
        assert!(codes_of(&diagnostics).iter().all(|c| *c == codes::NAMING_CONVENTION));
        assert!(diagnostics[2].message.contains("approved"));
    }

    #[test]
    fn test_persistence_rules() {
        let diagnostics = inspect(vec![
            RawDeclaration::collection("StringCollection", "java.lang.String", CollectionKind::Collection),
            RawDeclaration::item("Product", None)
                .with_attribute(RawAttribute::new("computed", "java.lang.String").persistence(PersistenceKind::Dynamic))
                .with_attribute(RawAttribute::new("legacy", "java.lang.String").persistence(PersistenceKind::Jalo))
                .with_attribute(RawAttribute::new("tags", "StringCollection"))
                .with_attribute(RawAttribute::new("code", "java.lang.String").optional(false)),
        ]);

        assert_eq!(
            codes_of(&diagnostics),
            [
                codes::INVALID_MODIFIERS,
                codes::DEPRECATED,
                codes::INVALID_MODIFIERS,
                codes::INVALID_MODIFIERS,
            ]
        );
        assert_eq!(diagnostics[1].severity, Severity::Warning);
    }

    #[test]
    fn test_list_relation_end_and_qualifier() {
        let diagnostics = inspect(vec![
            RawDeclaration::item("Product", None),
            RawDeclaration::item("Keyword", None),
            RawDeclaration::relation(
                "Product2Keywords",
                RawRelationEnd::new("Product", "Products", Cardinality::Many),
                RawRelationEnd::new("Keyword", "keywords", Cardinality::Many)
                    .with_collection_kind(CollectionKind::List),
            ),
        ]);

        assert_eq!(
            codes_of(&diagnostics),
            [codes::NAMING_CONVENTION, codes::DISCOURAGED]
        );
    }

    #[test]
    fn test_catalog_properties() {
        let raw = vec![
            RawDeclaration::item("CatalogVersion", None).with_property("catalogItemType", "true"),
            RawDeclaration::item("Product", None)
                .with_property("catalogVersionAttributeQualifier", "\"catalogVersion\"")
                .with_property("uniqueKeyAttributeQualifier", "code, catalogVersion")
                .with_attribute(RawAttribute::new("code", "java.lang.String").unique(true))
                .with_attribute(RawAttribute::new("catalogVersion", "CatalogVersion").unique(true)),
            RawDeclaration::item("Media", None)
                .with_property("catalogVersionAttributeQualifier", "name")
                .with_property("uniqueKeyAttributeQualifier", "code,name")
                .with_attribute(RawAttribute::new("code", "java.lang.String").unique(true))
                .with_attribute(RawAttribute::new("name", "java.lang.String")),
        ];
        let diagnostics = inspect(raw);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.code.as_deref() == Some(codes::UNRESOLVED_QUALIFIER)));
        assert!(diagnostics[1].message.ends_with("name"));
    }

    #[test]
    fn test_disabled_check_and_severity_override() {
        let raw = vec![
            RawDeclaration::item("GeneratedThing", None)
                .with_attribute(RawAttribute::new("legacy", "java.lang.String").persistence(PersistenceKind::Jalo)),
        ];
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        let model = GlobalTypeModel::from_groups(&[group.clone()], ModelConfig::default());

        let diagnostics = TypeSystemChecker::new(&model)
            .without(Check::TypeNameMustNotStartWithGenerated)
            .with_severity(Check::JaloPersistenceIsDeprecated, Severity::Info)
            .check_group(&group);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Info);
    }

    #[test]
    fn test_file_diagnostics_include_model_structure() {
        let raw = vec![RawDeclaration::item("Orphan", Some("Missing"))];
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        let model = GlobalTypeModel::from_groups(&[group.clone()], ModelConfig::default());

        let diagnostics = file_diagnostics(&model, &group);
        assert_eq!(codes_of(&diagnostics), [codes::UNRESOLVED_PARENT]);
    }

    #[test]
    fn test_uppercase_literal() {
        assert!(is_uppercase_literal("CHECK_2"));
        assert!(is_uppercase_literal("4K"));
        assert!(!is_uppercase_literal("Approved"));
    }
}
