//! Generation-keyed caches for narrow, per-node results.
//!
//! A consumer that memoizes something derived from the model (a resolved
//! reference, a completion list) stores it together with the generation it
//! was computed against. An entry is only served while that generation is
//! still the current one.

use std::hash::Hash;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::meta::GlobalTypeModel;

#[derive(Debug)]
pub struct GenerationCache<K, V> {
    entries: RwLock<FxHashMap<K, (u64, V)>>,
}

impl<K, V> Default for GenerationCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> GenerationCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value, if it was computed against `generation`.
    pub fn get(&self, key: &K, generation: u64) -> Option<V> {
        self.entries
            .read()
            .get(key)
            .filter(|(captured, _)| *captured == generation)
            .map(|(_, value)| value.clone())
    }

    /// Store `value` unless the entry already holds a newer generation.
    pub fn insert(&self, key: K, generation: u64, value: V) {
        let mut entries = self.entries.write();
        match entries.get_mut(&key) {
            Some(entry) if entry.0 > generation => {}
            Some(entry) => *entry = (generation, value),
            None => {
                entries.insert(key, (generation, value));
            }
        }
    }

    /// Serve a current entry or compute, store and return a fresh one.
    ///
    /// `compute` runs without the lock held.
    pub fn get_or_insert_with(&self, key: K, generation: u64, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key, generation) {
            return value;
        }
        let value = compute();
        self.insert(key, generation, value.clone());
        value
    }

    /// [`get_or_insert_with`](Self::get_or_insert_with) against a model snapshot.
    pub fn get_or_compute(
        &self,
        model: &GlobalTypeModel,
        key: K,
        compute: impl FnOnce(&GlobalTypeModel) -> V,
    ) -> V {
        self.get_or_insert_with(key, model.generation(), || compute(model))
    }

    /// Drop every entry not computed against `generation`.
    pub fn retain_generation(&self, generation: u64) {
        self.entries
            .write()
            .retain(|_, (captured, _)| *captured == generation);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_valid_only_for_its_generation() {
        let cache: GenerationCache<&str, usize> = GenerationCache::new();
        cache.insert("Product", 3, 42);

        assert_eq!(cache.get(&"Product", 3), Some(42));
        assert_eq!(cache.get(&"Product", 4), None);
        assert_eq!(cache.get(&"Category", 3), None);
    }

    #[test]
    fn test_get_or_insert_recomputes_after_generation_change() {
        let cache: GenerationCache<&str, usize> = GenerationCache::new();
        let mut calls = 0;

        let first = cache.get_or_insert_with("Product", 1, || {
            calls += 1;
            10
        });
        let cached = cache.get_or_insert_with("Product", 1, || {
            calls += 1;
            11
        });
        let fresh = cache.get_or_insert_with("Product", 2, || {
            calls += 1;
            12
        });

        assert_eq!((first, cached, fresh), (10, 10, 12));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_older_reader_keeps_newer_entry() {
        let cache: GenerationCache<&str, usize> = GenerationCache::new();
        cache.insert("Product", 5, 50);

        // a reader still holding generation 4 computes late
        let stale = cache.get_or_insert_with("Product", 4, || 40);
        assert_eq!(stale, 40);
        assert_eq!(cache.get(&"Product", 5), Some(50));

        cache.insert("Product", 6, 60);
        assert_eq!(cache.get(&"Product", 6), Some(60));
    }

    #[test]
    fn test_retain_generation_purges_stale() {
        let cache: GenerationCache<u32, u32> = GenerationCache::new();
        cache.insert(1, 1, 1);
        cache.insert(2, 2, 2);

        cache.retain_generation(2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2, 2), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }
}
