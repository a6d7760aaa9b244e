//! Model builder — merges local declarations into one node per type code.
//!
//! # Merge rules
//!
//! Declarations are visited in merge order (see [`MergeOrder`]); the later
//! contribution wins on every per-field conflict:
//!
//! | Kind       | Field               | Rule                                   |
//! |------------|---------------------|----------------------------------------|
//! | any        | kind                | last declaration's kind; others excluded and reported |
//! | any        | custom properties   | per key, last wins                     |
//! | Item       | parent              | last non-empty wins; a different earlier parent is reported |
//! | Item       | attributes, indexes | by qualifier / name, last wins         |
//! | Enum       | values              | union, first-seen order                |
//! | Enum       | dynamic             | set by any declaration                 |
//! | Relation   | ends                | last declaration's pair                |
//! | Collection, Map | element/key/value types | last wins                     |
//!
//! [`MergeOrder`]: crate::config::MergeOrder

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ModelConfig;
use crate::decl::{DeclBody, DeclarationGroup, LocalDeclaration};
use crate::error::RebuildError;

use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::ids::TypeId;
use super::inherit::{self, checkpoint};
use super::model::GlobalTypeModel;
use super::node::{
    Attribute, CollectionType, EnumType, EnumValue, Index, ItemType, MapType, NodeData,
    RelationType, TypeNode,
};

/// Merged nodes before inheritance resolution.
pub(crate) struct Merged {
    pub nodes: Vec<TypeNode>,
    pub by_code: FxHashMap<SmolStr, TypeId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build a complete generation from declaration groups in merge order.
///
/// `previous` enables incremental resolution when its code table matches
/// the new merge. Returns [`RebuildError::Superseded`] as soon as `cancel`
/// fires; nothing partial escapes.
#[tracing::instrument(level = "debug", skip_all, fields(groups = groups.len(), generation = generation, revision = revision))]
pub fn build_model(
    groups: &[Arc<DeclarationGroup>],
    config: Arc<ModelConfig>,
    previous: Option<&GlobalTypeModel>,
    generation: u64,
    revision: u64,
    cancel: &CancellationToken,
) -> Result<GlobalTypeModel, RebuildError> {
    let started = Instant::now();

    let Merged {
        mut nodes,
        by_code,
        diagnostics: merge_diagnostics,
    } = merge(groups, &config, cancel)?;
    checkpoint(cancel)?;

    let resolution = inherit::resolve(&mut nodes, &by_code, previous, &config, cancel)?;

    let mut diagnostics: Vec<Diagnostic> = groups
        .iter()
        .flat_map(|group| group.diagnostics.iter().cloned())
        .collect();
    diagnostics.extend(merge_diagnostics);
    diagnostics.extend(
        nodes
            .iter()
            .filter_map(|node| node.hierarchy.as_ref())
            .flat_map(|hierarchy| hierarchy.diagnostics.iter().cloned()),
    );

    debug!(
        nodes = nodes.len(),
        resolved = resolution.resolved,
        diagnostics = diagnostics.len(),
        scope = ?resolution.scope,
        elapsed_us = started.elapsed().as_micros() as u64,
        "model built"
    );

    Ok(GlobalTypeModel::new(
        generation,
        revision,
        config,
        nodes,
        by_code,
        resolution.children,
        diagnostics,
        resolution.scope,
    ))
}

/// Group declarations by code and merge each group into one node.
#[tracing::instrument(level = "trace", skip_all)]
pub(crate) fn merge(
    groups: &[Arc<DeclarationGroup>],
    config: &ModelConfig,
    cancel: &CancellationToken,
) -> Result<Merged, RebuildError> {
    let mut by_code_decls: IndexMap<SmolStr, Vec<&LocalDeclaration>> = IndexMap::new();
    for group in groups {
        for decl in &group.declarations {
            by_code_decls.entry(decl.code.clone()).or_default().push(decl);
        }
    }

    let mut collector = DiagnosticCollector::new();
    let mut nodes = Vec::with_capacity(by_code_decls.len());
    let mut by_code = FxHashMap::default();
    by_code.reserve(by_code_decls.len());
    let interval = config.cancel_check_interval.max(1);

    for (code, decls) in by_code_decls {
        if nodes.len() % interval == 0 {
            checkpoint(cancel)?;
        }
        let id = TypeId::new(nodes.len() as u32);
        if let Some(node) = merge_code(id, &code, &decls, &mut collector) {
            nodes.push(node);
            by_code.insert(code, id);
        }
    }

    Ok(Merged {
        nodes,
        by_code,
        diagnostics: collector.into_vec(),
    })
}

fn merge_code(
    id: TypeId,
    code: &SmolStr,
    decls: &[&LocalDeclaration],
    collector: &mut DiagnosticCollector,
) -> Option<TypeNode> {
    let winner = *decls.last()?;
    let kind = winner.kind();

    let mut contributing = Vec::with_capacity(decls.len());
    for decl in decls {
        if decl.kind() == kind {
            contributing.push(*decl);
        } else {
            collector.conflicting_kind(
                decl.provenance.location,
                code,
                decl.kind().display(),
                kind.display(),
                winner.provenance.location,
            );
        }
    }

    let data = match &winner.body {
        DeclBody::Item { .. } => NodeData::Item(merge_item(code, &contributing, collector)),
        DeclBody::Enum { .. } => NodeData::Enum(merge_enum(&contributing)),
        DeclBody::Relation { source, target } => NodeData::Relation(RelationType {
            source: source.clone(),
            target: target.clone(),
        }),
        DeclBody::Collection {
            element_type,
            collection_kind,
        } => NodeData::Collection(CollectionType {
            element_type: element_type.clone(),
            collection_kind: *collection_kind,
        }),
        DeclBody::Map {
            argument_type,
            return_type,
        } => NodeData::Map(MapType {
            argument_type: argument_type.clone(),
            return_type: return_type.clone(),
        }),
    };

    let mut custom_properties = IndexMap::new();
    for decl in &contributing {
        for (key, value) in &decl.custom_properties {
            custom_properties.insert(key.clone(), value.clone());
        }
    }

    Some(TypeNode {
        id,
        code: code.clone(),
        data,
        custom_properties,
        location: winner.provenance.location,
        provenance: contributing.iter().map(|decl| decl.provenance).collect(),
        hierarchy: None,
    })
}

fn merge_item(
    code: &SmolStr,
    decls: &[&LocalDeclaration],
    collector: &mut DiagnosticCollector,
) -> ItemType {
    let mut item = ItemType::default();

    for decl in decls {
        let DeclBody::Item {
            parent,
            attributes,
            indexes,
        } = &decl.body
        else {
            continue;
        };
        let location = decl.provenance.location;

        if let Some(parent) = parent {
            if let (Some(previous), Some(previous_location)) = (&item.parent, item.parent_location) {
                if previous != parent {
                    collector.conflicting_parent(location, code, parent, previous, previous_location);
                }
            }
            item.parent = Some(parent.clone());
            item.parent_location = Some(location);
        }

        for attr in attributes {
            if let Some(previous) = item.attributes.get(&attr.qualifier) {
                if incompatible(&previous.type_ref, &attr.type_ref) {
                    collector.incompatible_override(
                        attr.location,
                        &attr.qualifier,
                        &attr.type_ref,
                        &previous.type_ref,
                        previous.location,
                    );
                }
            }
            item.attributes
                .insert(attr.qualifier.clone(), Arc::new(Attribute::from_local(code, attr)));
        }

        for index in indexes {
            item.indexes
                .insert(index.name.clone(), Arc::new(Index::from_local(code, index)));
        }
    }

    item
}

fn merge_enum(decls: &[&LocalDeclaration]) -> EnumType {
    let mut merged = EnumType::default();
    for decl in decls {
        let DeclBody::Enum { values, dynamic } = &decl.body else {
            continue;
        };
        merged.dynamic |= *dynamic;
        for value in values {
            merged
                .values
                .entry(value.code.clone())
                .or_insert_with(|| EnumValue {
                    code: value.code.clone(),
                    location: value.location,
                });
        }
    }
    merged
}

/// Two known value types that differ.
pub(crate) fn incompatible(previous: &str, declared: &str) -> bool {
    !previous.is_empty() && !declared.is_empty() && previous != declared
}
