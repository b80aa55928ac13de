//! Path → component lookup.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{Component, ComponentList};
use crate::utils::path::normalize_source_path;

/// Registered roots keyed by normalized source path.
///
/// Built from the bootstrap pack. Pages created later are added with
/// [`ComponentRegistry::insert`]; entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    by_path: FxHashMap<String, Arc<Component>>,
}

impl ComponentRegistry {
    pub fn new(components: ComponentList) -> Self {
        Self {
            by_path: components
                .into_iter()
                .map(|c| (c.original_path().to_string(), c))
                .collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Arc<Component>> {
        self.by_path.get(normalize_source_path(path).as_str())
    }

    /// Component whose bundle key is `key`.
    pub fn find_by_key(&self, key: &str) -> Option<&Arc<Component>> {
        self.by_path.values().find(|c| c.bundle_key() == key)
    }

    /// Component exporting `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Component>> {
        self.by_path.values().find(|c| c.name() == name)
    }

    /// Register a component under its source path.
    pub fn insert(&mut self, component: Arc<Component>) {
        self.by_path
            .insert(component.original_path().to_string(), component);
    }

    /// Components for `paths`, skipping unknown ones.
    pub fn find_many<'a>(&self, paths: impl IntoIterator<Item = &'a String>) -> Vec<Arc<Component>> {
        paths
            .into_iter()
            .filter_map(|p| self.get(p).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Registered components in path order.
    pub fn components(&self) -> ComponentList {
        ComponentList::new(self.by_path.values().cloned().collect())
    }

    /// `(path, local dependencies)` for every root.
    pub fn root_dependencies(&self) -> Vec<(String, Vec<String>)> {
        let mut roots: Vec<_> = self
            .by_path
            .iter()
            .map(|(path, c)| (path.clone(), c.local_dependencies()))
            .collect();
        roots.sort_by(|a, b| a.0.cmp(&b.0));
        roots
    }
}
