//! Inheritance resolver — ancestor chains and inherited members.
//!
//! Every item type gets a [`Hierarchy`]: its root-first ancestor chain and
//! the union of its own and its ancestors' attributes, indexes, relation
//! ends and custom properties. Chains are walked once; each node derives
//! its hierarchy from its parent's already computed one.
//!
//! When the code table is unchanged since the previous generation, only the
//! subtrees below items whose merged content changed are recomputed. All
//! other hierarchies are shared with the previous generation.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ModelConfig;
use crate::decl::TypeKind;
use crate::error::RebuildError;

use super::builder::incompatible;
use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::ids::TypeId;
use super::model::GlobalTypeModel;
use super::node::{Hierarchy, HierarchyStatus, RelationEnd, RelationSide, TypeNode};

/// Which part of the model a resolution pass recomputed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChangeScope {
    /// Every item type was resolved from scratch.
    #[default]
    Full,
    /// Only these dirty items and everything below them.
    Subtrees(Vec<TypeId>),
}

impl ChangeScope {
    pub fn is_full(&self) -> bool {
        matches!(self, ChangeScope::Full)
    }
}

pub(crate) struct Resolution {
    /// Direct children per node, by resolved parent link.
    pub children: Vec<Vec<TypeId>>,
    pub scope: ChangeScope,
    /// Number of hierarchies computed (not reused).
    pub resolved: usize,
}

/// Return `Superseded` once the token has fired.
#[inline]
pub(crate) fn checkpoint(cancel: &CancellationToken) -> Result<(), RebuildError> {
    if cancel.is_cancelled() {
        return Err(RebuildError::Superseded);
    }
    Ok(())
}

/// Resolve every item type's hierarchy in place.
#[tracing::instrument(level = "debug", skip_all, fields(nodes = nodes.len()))]
pub(crate) fn resolve(
    nodes: &mut [TypeNode],
    by_code: &FxHashMap<SmolStr, TypeId>,
    previous: Option<&GlobalTypeModel>,
    config: &ModelConfig,
    cancel: &CancellationToken,
) -> Result<Resolution, RebuildError> {
    let links = Links::compute(nodes, by_code);
    let own_ends = relation_ends(nodes, by_code);
    checkpoint(cancel)?;

    let previous = previous.filter(|prev| config.incremental && prev.same_code_table(nodes));
    let (scope, hierarchies) = match previous {
        Some(prev) => {
            let dirty = dirty_items(nodes, &own_ends, prev);
            let affected = subtrees(&dirty, &links.children);
            trace!(dirty = dirty.len(), affected = affected.len(), "incremental resolution");
            let reused = nodes
                .iter()
                .map(|node| {
                    if affected.contains(&node.id) {
                        None
                    } else {
                        prev.node(node.id).and_then(|old| old.hierarchy.clone())
                    }
                })
                .collect();
            (ChangeScope::Subtrees(dirty), reused)
        }
        None => (ChangeScope::Full, vec![None; nodes.len()]),
    };
    checkpoint(cancel)?;

    let mut pass = Pass {
        nodes: &*nodes,
        links: &links,
        own_ends: &own_ends,
        hierarchies,
        resolved: 0,
        interval: config.cancel_check_interval.max(1),
        cancel,
    };
    for id in (0..nodes.len()).map(|i| TypeId::new(i as u32)) {
        if pass.needs_resolution(id) {
            pass.resolve_chain(id)?;
        }
    }
    let Pass {
        hierarchies,
        resolved,
        ..
    } = pass;

    for (node, hierarchy) in nodes.iter_mut().zip(hierarchies) {
        node.hierarchy = hierarchy;
    }

    debug!(resolved, scope = ?scope, "hierarchies resolved");
    Ok(Resolution {
        children: links.children,
        scope,
        resolved,
    })
}

// ============================================================================
// LINKS
// ============================================================================

/// Parent links resolved by code.
struct Links {
    parent_of: Vec<Option<TypeId>>,
    /// Parent code that is unknown or names a non-item classifier.
    missing: Vec<Option<SmolStr>>,
    children: Vec<Vec<TypeId>>,
}

impl Links {
    fn compute(nodes: &[TypeNode], by_code: &FxHashMap<SmolStr, TypeId>) -> Self {
        let mut links = Links {
            parent_of: vec![None; nodes.len()],
            missing: vec![None; nodes.len()],
            children: vec![Vec::new(); nodes.len()],
        };

        for node in nodes {
            let Some(parent) = node.as_item().and_then(|item| item.parent.as_ref()) else {
                continue;
            };
            match by_code.get(parent) {
                Some(&parent_id) if nodes[parent_id.index()].kind() == TypeKind::Item => {
                    links.parent_of[node.id.index()] = Some(parent_id);
                    links.children[parent_id.index()].push(node.id);
                }
                _ => links.missing[node.id.index()] = Some(parent.clone()),
            }
        }

        links
    }
}

/// Relation ends each item type navigates, from its own relations only.
fn relation_ends(
    nodes: &[TypeNode],
    by_code: &FxHashMap<SmolStr, TypeId>,
) -> Vec<Vec<Arc<RelationEnd>>> {
    let mut ends = vec![Vec::new(); nodes.len()];

    for node in nodes {
        let Some(relation) = node.as_relation() else {
            continue;
        };
        let sides = [
            (RelationSide::Target, &relation.source, &relation.target),
            (RelationSide::Source, &relation.target, &relation.source),
        ];
        // the type bound to `bound` navigates the opposite end
        for (side, bound, navigated) in sides {
            let Some(&owner) = by_code.get(&bound.type_code) else {
                continue;
            };
            if nodes[owner.index()].kind() != TypeKind::Item {
                continue;
            }
            ends[owner.index()].push(Arc::new(RelationEnd::new(
                &node.code,
                side,
                navigated,
                &bound.type_code,
            )));
        }
    }

    ends
}

/// Items whose own merged content or own relation ends changed.
fn dirty_items(
    nodes: &[TypeNode],
    own_ends: &[Vec<Arc<RelationEnd>>],
    previous: &GlobalTypeModel,
) -> Vec<TypeId> {
    nodes
        .iter()
        .filter(|node| node.kind() == TypeKind::Item)
        .filter(|node| match previous.node(node.id) {
            Some(old) => {
                !old.same_content(node)
                    || old
                        .hierarchy
                        .as_ref()
                        .is_none_or(|h| h.own_relation_ends != own_ends[node.id.index()])
            }
            None => true,
        })
        .map(|node| node.id)
        .collect()
}

/// The roots plus every node reachable through child links.
fn subtrees(roots: &[TypeId], children: &[Vec<TypeId>]) -> FxHashSet<TypeId> {
    let mut seen = FxHashSet::default();
    let mut stack: Vec<TypeId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(children[id.index()].iter().copied());
        }
    }
    seen
}

// ============================================================================
// PASS
// ============================================================================

struct Pass<'a> {
    nodes: &'a [TypeNode],
    links: &'a Links,
    own_ends: &'a [Vec<Arc<RelationEnd>>],
    hierarchies: Vec<Option<Arc<Hierarchy>>>,
    resolved: usize,
    interval: usize,
    cancel: &'a CancellationToken,
}

impl Pass<'_> {
    fn needs_resolution(&self, id: TypeId) -> bool {
        self.nodes[id.index()].kind() == TypeKind::Item && self.hierarchies[id.index()].is_none()
    }

    /// Walk up from `start` until a resolved node, a root or a cycle, then
    /// derive the walked chain top-down.
    fn resolve_chain(&mut self, start: TypeId) -> Result<(), RebuildError> {
        let mut path: Vec<TypeId> = Vec::new();
        let mut on_path: FxHashMap<TypeId, usize> = FxHashMap::default();
        let mut cycle_start = None;
        let mut cursor = Some(start);

        while let Some(id) = cursor {
            if self.hierarchies[id.index()].is_some() {
                break;
            }
            if let Some(&position) = on_path.get(&id) {
                cycle_start = Some(position);
                break;
            }
            on_path.insert(id, path.len());
            path.push(id);
            cursor = self.links.parent_of[id.index()];
        }

        let lead_in = match cycle_start {
            Some(position) => {
                self.mark_cycle(&path[position..])?;
                position
            }
            None => path.len(),
        };

        for &id in path[..lead_in].iter().rev() {
            self.derive(id)?;
        }
        Ok(())
    }

    /// `members` in child-to-parent order.
    fn mark_cycle(&mut self, members: &[TypeId]) -> Result<(), RebuildError> {
        let nodes = self.nodes;
        let mut codes: Vec<&str> = members
            .iter()
            .map(|id| nodes[id.index()].code.as_str())
            .collect();
        if let Some(&first) = codes.first() {
            codes.push(first);
        }

        for &id in members {
            let node = &nodes[id.index()];
            let mut collector = DiagnosticCollector::new();
            collector.cyclic_extends(node.location, &node.code, &codes);
            let hierarchy = self.own_only(id, HierarchyStatus::Cycle, collector.into_vec());
            self.store(id, hierarchy)?;
        }
        Ok(())
    }

    fn derive(&mut self, id: TypeId) -> Result<(), RebuildError> {
        let (nodes, links) = (self.nodes, self.links);
        let node = &nodes[id.index()];
        let Some(item) = node.as_item() else {
            return Ok(());
        };

        if let Some(missing) = &links.missing[id.index()] {
            let mut collector = DiagnosticCollector::new();
            collector.unresolved_parent(
                item.parent_location.unwrap_or(node.location),
                &node.code,
                missing,
            );
            let status = HierarchyStatus::Incomplete {
                missing: missing.clone(),
            };
            let hierarchy = self.own_only(id, status, collector.into_vec());
            return self.store(id, hierarchy);
        }

        let parent = links.parent_of[id.index()]
            .and_then(|parent| self.hierarchies[parent.index()].clone());
        let Some(parent) = parent else {
            let hierarchy = self.own_only(id, HierarchyStatus::Complete, Vec::new());
            return self.store(id, hierarchy);
        };

        // leads into a cycle; members were reported already
        if parent.is_cycle() {
            let hierarchy = self.own_only(id, HierarchyStatus::Cycle, Vec::new());
            return self.store(id, hierarchy);
        }

        let mut collector = DiagnosticCollector::new();

        let mut ancestors = Vec::with_capacity(parent.ancestors.len() + 1);
        ancestors.extend_from_slice(&parent.ancestors);
        ancestors.push(id);

        let mut all_attributes = parent.all_attributes.clone();
        for (qualifier, attr) in &item.attributes {
            if let Some(inherited) = all_attributes.get(qualifier) {
                if incompatible(&inherited.type_ref, &attr.type_ref) {
                    collector.incompatible_override(
                        attr.location,
                        qualifier,
                        &attr.type_ref,
                        &inherited.type_ref,
                        inherited.location,
                    );
                }
            }
            all_attributes.insert(qualifier.clone(), attr.clone());
        }

        let mut all_indexes = parent.all_indexes.clone();
        for (name, index) in &item.indexes {
            all_indexes.insert(name.clone(), index.clone());
        }

        let own_relation_ends = self.own_ends[id.index()].clone();
        let mut all_relation_ends = parent.all_relation_ends.clone();
        all_relation_ends.extend(own_relation_ends.iter().cloned());

        let mut all_custom_properties = parent.all_custom_properties.clone();
        for (key, value) in &node.custom_properties {
            all_custom_properties.insert(key.clone(), value.clone());
        }

        let hierarchy = Hierarchy {
            status: parent.status.clone(),
            ancestors,
            all_attributes,
            all_indexes,
            own_relation_ends,
            all_relation_ends,
            all_custom_properties,
            diagnostics: collector.into_vec(),
        };
        self.store(id, hierarchy)
    }

    /// A hierarchy made of the node's own members only.
    fn own_only(&self, id: TypeId, status: HierarchyStatus, diagnostics: Vec<Diagnostic>) -> Hierarchy {
        let node = &self.nodes[id.index()];
        let own_relation_ends = self.own_ends[id.index()].clone();
        let (all_attributes, all_indexes) = node
            .as_item()
            .map(|item| (item.attributes.clone(), item.indexes.clone()))
            .unwrap_or_default();

        Hierarchy {
            status,
            ancestors: vec![id],
            all_attributes,
            all_indexes,
            all_relation_ends: own_relation_ends.clone(),
            own_relation_ends,
            all_custom_properties: node.custom_properties.clone(),
            diagnostics,
        }
    }

    fn store(&mut self, id: TypeId, hierarchy: Hierarchy) -> Result<(), RebuildError> {
        self.hierarchies[id.index()] = Some(Arc::new(hierarchy));
        self.resolved += 1;
        if self.resolved % self.interval == 0 {
            checkpoint(self.cancel)?;
        }
        Ok(())
    }
}
