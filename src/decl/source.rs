//! Source set — the current Local Declaration set of a workspace.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{FileId, ModuleId};
use crate::config::MergeOrder;

use super::types::DeclarationGroup;

/// A registered source module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub name: SmolStr,
    /// Project extension rather than a platform module.
    pub custom: bool,
}

/// Tracks modules, file ids and the declaration group of every file.
///
/// This is the input side of the model: the
/// [`TypeSystemHost`](crate::state::TypeSystemHost) edits it, and every
/// rebuild merges a snapshot of its groups. Groups are shared as `Arc`s so a
/// snapshot costs one pointer copy per file.
#[derive(Clone, Debug, Default)]
pub struct SourceSet {
    /// Module name → info; the index is the `ModuleId`.
    modules: IndexMap<SmolStr, ModuleInfo>,
    path_to_id: IndexMap<Arc<str>, FileId>,
    id_to_path: IndexMap<FileId, Arc<str>>,
    groups: IndexMap<FileId, Arc<DeclarationGroup>>,
    next_id: u32,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or register a module.
    ///
    /// Registration order is the default merge order. Re-registering a known
    /// name returns its existing id and keeps its original `custom` flag.
    pub fn register_module(&mut self, name: &str, custom: bool) -> ModuleId {
        if let Some(info) = self.modules.get(name) {
            return info.id;
        }
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules.insert(
            SmolStr::new(name),
            ModuleInfo {
                id,
                name: SmolStr::new(name),
                custom,
            },
        );
        id
    }

    pub fn module(&self, id: ModuleId) -> Option<&ModuleInfo> {
        self.modules
            .get_index(id.index() as usize)
            .map(|(_, info)| info)
    }

    pub fn module_by_name(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    /// Get or create a FileId for a path.
    pub fn file_id(&mut self, path: &str) -> FileId {
        if let Some(&id) = self.path_to_id.get(path) {
            return id;
        }
        let id = FileId::new(self.next_id);
        self.next_id += 1;
        let path: Arc<str> = Arc::from(path);
        self.path_to_id.insert(path.clone(), id);
        self.id_to_path.insert(id, path);
        id
    }

    pub fn lookup_file(&self, path: &str) -> Option<FileId> {
        self.path_to_id.get(path).copied()
    }

    pub fn path(&self, file: FileId) -> Option<&str> {
        self.id_to_path.get(&file).map(|p| p.as_ref())
    }

    /// Replace a file's declaration group wholesale.
    ///
    /// Returns `false` when the new group equals the stored one, so that
    /// re-saving an unchanged file does not invalidate the model.
    pub fn set_group(&mut self, group: DeclarationGroup) -> bool {
        if self
            .groups
            .get(&group.file)
            .is_some_and(|existing| **existing == group)
        {
            return false;
        }
        self.groups.insert(group.file, Arc::new(group));
        true
    }

    /// Drop a file and its declarations. Returns whether anything was removed.
    pub fn remove_file(&mut self, file: FileId) -> bool {
        if let Some(path) = self.id_to_path.swap_remove(&file) {
            self.path_to_id.swap_remove(&path);
        }
        self.groups.shift_remove(&file).is_some()
    }

    pub fn group(&self, file: FileId) -> Option<&Arc<DeclarationGroup>> {
        self.groups.get(&file)
    }

    /// All groups in the order the model builder must merge them.
    pub fn groups_in_merge_order(&self, order: MergeOrder) -> Vec<Arc<DeclarationGroup>> {
        let mut groups: Vec<_> = self.groups.values().cloned().collect();
        groups.sort_by_key(|group| {
            let rank = match order {
                MergeOrder::LoadOrder => 0,
                MergeOrder::PlatformFirst => {
                    self.module(group.module).map_or(0, |m| u8::from(m.custom))
                }
            };
            (rank, group.module, group.file)
        });
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{adapt_file, RawDeclaration};

    fn group(sources: &mut SourceSet, path: &str, module: &str, custom: bool, code: &str) -> DeclarationGroup {
        let module = sources.register_module(module, custom);
        let file = sources.file_id(path);
        adapt_file(file, module, &[RawDeclaration::item(code, None)])
    }

    #[test]
    fn test_file_id_assignment() {
        let mut sources = SourceSet::new();

        let id1 = sources.file_id("/core/core-items.xml");
        let id2 = sources.file_id("/custom/custom-items.xml");
        let id3 = sources.file_id("/core/core-items.xml");

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert_eq!(sources.path(id2), Some("/custom/custom-items.xml"));
    }

    #[test]
    fn test_set_group_detects_no_op() {
        let mut sources = SourceSet::new();
        let g = group(&mut sources, "/a.xml", "core", false, "Product");

        assert!(sources.set_group(g.clone()));
        assert!(!sources.set_group(g));
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_remove_file() {
        let mut sources = SourceSet::new();
        let g = group(&mut sources, "/a.xml", "core", false, "Product");
        let file = g.file;
        sources.set_group(g);

        assert!(sources.remove_file(file));
        assert!(!sources.remove_file(file));
        assert!(sources.is_empty());
        assert_eq!(sources.lookup_file("/a.xml"), None);
    }

    #[test]
    fn test_merge_order_platform_first() {
        let mut sources = SourceSet::new();
        // custom module registered before the platform one
        let custom = group(&mut sources, "/custom.xml", "custom", true, "Product");
        let core = group(&mut sources, "/core.xml", "core", false, "Product");
        sources.set_group(custom);
        sources.set_group(core);

        let load: Vec<_> = sources
            .groups_in_merge_order(MergeOrder::LoadOrder)
            .iter()
            .map(|g| sources.path(g.file).unwrap_or_default().to_string())
            .collect();
        assert_eq!(load, ["/custom.xml", "/core.xml"]);

        let platform_first: Vec<_> = sources
            .groups_in_merge_order(MergeOrder::PlatformFirst)
            .iter()
            .map(|g| sources.path(g.file).unwrap_or_default().to_string())
            .collect();
        assert_eq!(platform_first, ["/core.xml", "/custom.xml"]);
    }

    #[test]
    fn test_register_module_is_stable() {
        let mut sources = SourceSet::new();
        let a = sources.register_module("core", false);
        let b = sources.register_module("custom", true);
        assert_eq!(sources.register_module("core", true), a);
        assert_ne!(a, b);
        assert!(!sources.module(a).is_some_and(|m| m.custom));
    }
}
