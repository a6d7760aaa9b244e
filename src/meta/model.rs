//! The Global Type Model — one immutable, fully resolved generation.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::base::FileId;
use crate::config::ModelConfig;
use crate::decl::{DeclarationGroup, TypeKind};

use super::access::TypeAccess;
use super::builder::build_model;
use super::diagnostics::Diagnostic;
use super::ids::TypeId;
use super::inherit::ChangeScope;
use super::node::TypeNode;

/// All nodes of one generation, stored in an arena indexed by [`TypeId`].
///
/// A model is never mutated after construction. Readers hold it through an
/// `Arc` and keep seeing the same generation for as long as they hold it.
#[derive(Debug)]
pub struct GlobalTypeModel {
    generation: u64,
    /// Source revision the model was built from.
    revision: u64,
    config: Arc<ModelConfig>,
    nodes: Vec<TypeNode>,
    by_code: FxHashMap<SmolStr, TypeId>,
    children: Vec<Vec<TypeId>>,
    /// Transitive children, computed on first request.
    descendants: Vec<OnceCell<Arc<[TypeId]>>>,
    diagnostics: Vec<Diagnostic>,
    change_scope: ChangeScope,
}

impl GlobalTypeModel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        generation: u64,
        revision: u64,
        config: Arc<ModelConfig>,
        nodes: Vec<TypeNode>,
        by_code: FxHashMap<SmolStr, TypeId>,
        children: Vec<Vec<TypeId>>,
        diagnostics: Vec<Diagnostic>,
        change_scope: ChangeScope,
    ) -> Self {
        let descendants = (0..nodes.len()).map(|_| OnceCell::new()).collect();
        Self {
            generation,
            revision,
            config,
            nodes,
            by_code,
            children,
            descendants,
            diagnostics,
            change_scope,
        }
    }

    /// The model of generation zero: no declarations at all.
    pub fn empty(config: Arc<ModelConfig>) -> Self {
        Self::new(
            0,
            0,
            config,
            Vec::new(),
            FxHashMap::default(),
            Vec::new(),
            Vec::new(),
            ChangeScope::Full,
        )
    }

    /// Build a standalone model (generation 1) outside any host.
    pub fn from_groups(groups: &[Arc<DeclarationGroup>], config: ModelConfig) -> Self {
        let config = Arc::new(config);
        // a fresh token is never cancelled
        build_model(groups, config.clone(), None, 1, 0, &CancellationToken::new())
            .unwrap_or_else(|_| Self::empty(config))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// What the resolver recomputed for this generation.
    pub fn change_scope(&self) -> &ChangeScope {
        &self.change_scope
    }

    /// Query facade over this generation.
    pub fn access(&self) -> TypeAccess<'_> {
        TypeAccess::new(self)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: TypeId) -> Option<&TypeNode> {
        self.nodes.get(id.index())
    }

    pub fn id_of(&self, code: &str) -> Option<TypeId> {
        self.by_code.get(code).copied()
    }

    /// Exact, case-sensitive lookup of any kind.
    pub fn node_by_code(&self, code: &str) -> Option<&TypeNode> {
        self.id_of(code).and_then(|id| self.node(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.iter()
    }

    pub fn nodes_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = &TypeNode> {
        self.nodes.iter().filter(move |node| node.kind() == kind)
    }

    /// Direct subtypes by resolved `extends` link.
    pub fn children(&self, id: TypeId) -> &[TypeId] {
        self.children.get(id.index()).map(Vec::as_slice).unwrap_or_default()
    }

    /// All transitive subtypes, excluding `id` itself.
    ///
    /// Computed once per node and generation; safe on cyclic chains.
    pub fn descendants(&self, id: TypeId) -> Arc<[TypeId]> {
        let Some(cell) = self.descendants.get(id.index()) else {
            return Arc::from([]);
        };
        cell.get_or_init(|| {
            let mut seen = FxHashSet::default();
            let mut order = Vec::new();
            let mut stack: Vec<TypeId> = self.children(id).iter().rev().copied().collect();
            while let Some(next) = stack.pop() {
                if next == id || !seen.insert(next) {
                    continue;
                }
                order.push(next);
                stack.extend(self.children(next).iter().rev().copied());
            }
            Arc::from(order)
        })
        .clone()
    }

    /// Every diagnostic of this generation: adapter, merge and structural.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for_file(&self, file: FileId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.file() == file)
    }

    /// Same codes in the same order with the same kinds.
    pub(crate) fn same_code_table(&self, nodes: &[TypeNode]) -> bool {
        self.nodes.len() == nodes.len()
            && self
                .nodes
                .iter()
                .zip(nodes)
                .all(|(old, new)| old.code == new.code && old.kind() == new.kind())
    }

    /// Whether two generations hold identical nodes.
    pub fn same_nodes(&self, other: &GlobalTypeModel) -> bool {
        self.nodes == other.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ModuleId;
    use crate::decl::{adapt_file, RawDeclaration};

    fn model(raw: Vec<RawDeclaration>) -> GlobalTypeModel {
        let group = Arc::new(adapt_file(FileId::new(0), ModuleId::new(0), &raw));
        GlobalTypeModel::from_groups(&[group], ModelConfig::default())
    }

    #[test]
    fn test_empty_model() {
        let model = GlobalTypeModel::empty(Arc::new(ModelConfig::default()));
        assert_eq!(model.generation(), 0);
        assert!(model.is_empty());
        assert!(model.node_by_code("Product").is_none());
        assert!(model.descendants(TypeId::new(5)).is_empty());
    }

    #[test]
    fn test_descendants_are_transitive_and_lazy() {
        let model = model(vec![
            RawDeclaration::item("Product", None),
            RawDeclaration::item("VariantProduct", Some("Product")),
            RawDeclaration::item("ApparelSizeVariant", Some("VariantProduct")),
            RawDeclaration::item("Unrelated", None),
        ]);

        let product = model.id_of("Product").expect("Product");
        let codes: Vec<_> = model
            .descendants(product)
            .iter()
            .filter_map(|&id| model.node(id))
            .map(|node| node.code.to_string())
            .collect();
        assert_eq!(codes, ["VariantProduct", "ApparelSizeVariant"]);
        // cached
        assert!(Arc::ptr_eq(&model.descendants(product), &model.descendants(product)));
    }

    #[test]
    fn test_descendants_on_cycle_terminate() {
        let model = model(vec![
            RawDeclaration::item("A", Some("B")),
            RawDeclaration::item("B", Some("A")),
        ]);
        let a = model.id_of("A").expect("A");
        let descendants = model.descendants(a);
        assert_eq!(descendants.len(), 1);
    }

    #[test]
    fn test_diagnostics_for_file() {
        let model = model(vec![RawDeclaration::item("Orphan", Some("Missing"))]);
        assert_eq!(model.diagnostics_for_file(FileId::new(0)).count(), 1);
        assert_eq!(model.diagnostics_for_file(FileId::new(1)).count(), 0);
    }
}
