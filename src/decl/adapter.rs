//! Declaration source adapter — raw parser records to local declarations.
//!
//! Adaptation is a pure function of one file's raw records. A malformed
//! element degrades to a partial declaration (or is dropped when it cannot
//! be keyed at all) and is reported; it never aborts the rest of the file.

use rayon::prelude::*;
use smol_str::SmolStr;

use crate::base::{FileId, Location, ModuleId};
use crate::meta::DiagnosticCollector;

use super::raw::{
    RawAttribute, RawDeclaration, RawEnumValue, RawFile, RawIndex, RawModifiers, RawRange,
    RawRelationEnd,
};
use super::source::SourceSet;
use super::types::{
    Cardinality, CollectionKind, CustomProperties, DeclBody, DeclarationGroup, EnumValueDecl, LocalAttribute,
    LocalDeclaration, LocalIndex, Modifiers, Provenance, RelationEndDecl, TypeKind,
};

/// Prefix marking a localized attribute type, e.g. `localized:java.lang.String`.
pub const LOCALIZED_PREFIX: &str = "localized:";

/// Adapt all raw declarations of one file.
pub fn adapt_file(file: FileId, module: ModuleId, raw: &[RawDeclaration]) -> DeclarationGroup {
    let mut adapter = Adapter {
        file,
        module,
        collector: DiagnosticCollector::new(),
    };

    let declarations = raw
        .iter()
        .filter_map(|decl| adapter.declaration(decl))
        .collect();

    DeclarationGroup {
        file,
        module,
        declarations,
        diagnostics: adapter.collector.into_vec(),
    }
}

/// Register and adapt a batch of raw files in parallel.
///
/// Ids are assigned sequentially first so that the result does not depend
/// on scheduling; only the pure adaptation runs on the rayon pool.
pub fn adapt_files(sources: &mut SourceSet, files: &[RawFile]) -> Vec<DeclarationGroup> {
    let ids: Vec<(FileId, ModuleId)> = files
        .iter()
        .map(|raw| {
            let module = sources.register_module(&raw.module, raw.custom);
            (sources.file_id(&raw.path), module)
        })
        .collect();

    files
        .par_iter()
        .zip(ids.par_iter())
        .map(|(raw, &(file, module))| adapt_file(file, module, &raw.declarations))
        .collect()
}

struct Adapter {
    file: FileId,
    module: ModuleId,
    collector: DiagnosticCollector,
}

impl Adapter {
    fn location(&self, range: RawRange) -> Location {
        Location::from_offsets(self.file, range)
    }

    fn declaration(&mut self, raw: &RawDeclaration) -> Option<LocalDeclaration> {
        let location = self.location(raw.range);
        let Some(code) = non_empty(raw.code.as_deref()) else {
            self.collector
                .malformed(location, &format!("{} without a code", raw.kind));
            return None;
        };

        let body = match raw.kind {
            TypeKind::Item => DeclBody::Item {
                parent: non_empty(raw.parent.as_deref()),
                attributes: raw
                    .attributes
                    .iter()
                    .filter_map(|attr| self.attribute(&code, attr))
                    .collect(),
                indexes: raw
                    .indexes
                    .iter()
                    .filter_map(|index| self.index(&code, index))
                    .collect(),
            },
            TypeKind::Enum => DeclBody::Enum {
                values: raw
                    .values
                    .iter()
                    .filter_map(|value| self.enum_value(&code, value))
                    .collect(),
                dynamic: raw.dynamic.unwrap_or(false),
            },
            TypeKind::Relation => DeclBody::Relation {
                source: self.relation_end(&code, "source", raw.source.as_ref(), location),
                target: self.relation_end(&code, "target", raw.target.as_ref(), location),
            },
            TypeKind::Collection => DeclBody::Collection {
                element_type: self.required(&code, "element type", raw.element_type.as_deref(), location),
                collection_kind: raw.collection_kind.unwrap_or_default(),
            },
            TypeKind::Map => DeclBody::Map {
                argument_type: self.required(&code, "argument type", raw.argument_type.as_deref(), location),
                return_type: self.required(&code, "return type", raw.return_type.as_deref(), location),
            },
        };

        Some(LocalDeclaration {
            code,
            body,
            custom_properties: custom_properties(&raw.custom_properties),
            provenance: Provenance {
                module: self.module,
                location,
            },
        })
    }

    /// A field the model can live without; missing means "unknown".
    fn required(&mut self, code: &str, what: &str, value: Option<&str>, location: Location) -> SmolStr {
        match non_empty(value) {
            Some(value) => value,
            None => {
                self.collector
                    .malformed(location, &format!("'{}' has no {}", code, what));
                SmolStr::default()
            }
        }
    }

    fn attribute(&mut self, owner: &str, raw: &RawAttribute) -> Option<LocalAttribute> {
        let location = self.location(raw.range);
        let Some(qualifier) = non_empty(raw.qualifier.as_deref()) else {
            self.collector
                .malformed(location, &format!("attribute of '{}' without a qualifier", owner));
            return None;
        };

        let declared = raw.type_ref.as_deref().map(str::trim).unwrap_or_default();
        let (type_ref, prefixed) = match declared.strip_prefix(LOCALIZED_PREFIX) {
            Some(inner) => (inner.trim(), true),
            None => (declared, false),
        };

        Some(LocalAttribute {
            qualifier,
            type_ref: SmolStr::new(type_ref),
            localized: prefixed || raw.modifiers.localized.unwrap_or(false),
            persistence: raw.persistence.unwrap_or_default(),
            modifiers: modifiers(&raw.modifiers),
            handler: non_empty(raw.handler.as_deref()),
            default_value: non_empty(raw.default_value.as_deref()),
            custom_properties: custom_properties(&raw.custom_properties),
            location,
        })
    }

    fn index(&mut self, owner: &str, raw: &RawIndex) -> Option<LocalIndex> {
        let location = self.location(raw.range);
        let Some(name) = non_empty(raw.name.as_deref()) else {
            self.collector
                .malformed(location, &format!("index of '{}' without a name", owner));
            return None;
        };

        Some(LocalIndex {
            name,
            keys: raw
                .keys
                .iter()
                .filter_map(|key| non_empty(Some(key.as_str())))
                .collect(),
            unique: raw.unique.unwrap_or(false),
            location,
        })
    }

    fn enum_value(&mut self, owner: &str, raw: &RawEnumValue) -> Option<EnumValueDecl> {
        let location = self.location(raw.range);
        let Some(code) = non_empty(raw.code.as_deref()) else {
            self.collector
                .malformed(location, &format!("value of '{}' without a code", owner));
            return None;
        };
        Some(EnumValueDecl { code, location })
    }

    fn relation_end(
        &mut self,
        owner: &str,
        side: &str,
        raw: Option<&RawRelationEnd>,
        fallback: Location,
    ) -> RelationEndDecl {
        let Some(raw) = raw else {
            self.collector
                .malformed(fallback, &format!("relation '{}' has no {} end", owner, side));
            return RelationEndDecl {
                type_code: SmolStr::default(),
                qualifier: None,
                cardinality: Default::default(),
                ordering: Vec::new(),
                collection_kind: None,
                navigable: true,
                modifiers: Modifiers::default(),
                location: fallback,
            };
        };

        let location = raw.range.map_or(fallback, |_| self.location(raw.range));
        let type_code = self.required(owner, &format!("{} type", side), raw.type_code.as_deref(), location);

        RelationEndDecl {
            type_code,
            qualifier: non_empty(raw.qualifier.as_deref()),
            cardinality: raw.cardinality.unwrap_or_default(),
            ordering: raw
                .ordering
                .iter()
                .filter_map(|key| non_empty(Some(key.as_str())))
                .collect(),
            collection_kind: raw.collection_kind.or_else(|| {
                // MANY ends without a hint are plain collections
                (raw.cardinality == Some(Cardinality::Many))
                    .then_some(CollectionKind::Collection)
            }),
            navigable: raw.navigable.unwrap_or(true),
            modifiers: modifiers(&raw.modifiers),
            location,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<SmolStr> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(SmolStr::new)
}

fn modifiers(raw: &RawModifiers) -> Modifiers {
    let defaults = Modifiers::default();
    Modifiers {
        read: raw.read.unwrap_or(defaults.read),
        write: raw.write.unwrap_or(defaults.write),
        search: raw.search.unwrap_or(defaults.search),
        optional: raw.optional.unwrap_or(defaults.optional),
        unique: raw.unique.unwrap_or(defaults.unique),
        initial: raw.initial.unwrap_or(defaults.initial),
        private: raw.private.unwrap_or(defaults.private),
        removable: raw.removable.unwrap_or(defaults.removable),
        part_of: raw.part_of.unwrap_or(defaults.part_of),
        encrypted: raw.encrypted.unwrap_or(defaults.encrypted),
    }
}

fn custom_properties(raw: &std::collections::BTreeMap<String, String>) -> CustomProperties {
    raw.iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (SmolStr::new(key.trim()), SmolStr::new(value.trim())))
        .collect()
}
