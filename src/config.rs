//! Model configuration.
//!
//! A [`ModelConfig`] is fixed for the lifetime of a
//! [`TypeSystemHost`](crate::state::TypeSystemHost) and shared with every
//! generation it publishes.

use smol_str::SmolStr;

/// Order in which module contributions are merged.
///
/// Later contributions win on every per-field conflict.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "snake_case"))]
pub enum MergeOrder {
    /// Module registration order, then file order within a module.
    #[default]
    LoadOrder,
    /// Platform modules first, then custom modules, each group in
    /// registration order. Project extensions always override the platform.
    PlatformFirst,
}

/// Tunables for building and querying the global type model.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(default))]
pub struct ModelConfig {
    pub merge_order: MergeOrder,
    /// Re-resolve only dirty subtrees when the code table is unchanged.
    pub incremental: bool,
    /// Custom property marking an item type as catalog aware.
    pub catalog_aware_marker: SmolStr,
    /// Custom property naming the catalog version attribute of a type.
    pub catalog_version_qualifier_key: SmolStr,
    /// Custom property listing the unique key attributes of a type.
    pub unique_key_qualifier_key: SmolStr,
    /// How many nodes a rebuild processes between cancellation checks.
    pub cancel_check_interval: usize,
    /// Recursion bound when completing through collection element types.
    pub max_completion_depth: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            merge_order: MergeOrder::default(),
            incremental: true,
            catalog_aware_marker: SmolStr::new_static("catalogItemType"),
            catalog_version_qualifier_key: SmolStr::new_static("catalogVersionAttributeQualifier"),
            unique_key_qualifier_key: SmolStr::new_static("uniqueKeyAttributeQualifier"),
            cancel_check_interval: 256,
            max_completion_depth: 3,
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge_order(mut self, order: MergeOrder) -> Self {
        self.merge_order = order;
        self
    }

    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_catalog_aware_marker(mut self, key: impl Into<SmolStr>) -> Self {
        self.catalog_aware_marker = key.into();
        self
    }

    pub fn with_catalog_version_qualifier_key(mut self, key: impl Into<SmolStr>) -> Self {
        self.catalog_version_qualifier_key = key.into();
        self
    }

    pub fn with_unique_key_qualifier_key(mut self, key: impl Into<SmolStr>) -> Self {
        self.unique_key_qualifier_key = key.into();
        self
    }

    pub fn with_cancel_check_interval(mut self, nodes: usize) -> Self {
        // zero would never check
        self.cancel_check_interval = nodes.max(1);
        self
    }

    pub fn with_max_completion_depth(mut self, depth: usize) -> Self {
        self.max_completion_depth = depth;
        self
    }
}
