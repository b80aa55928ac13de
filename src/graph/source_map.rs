//! Reverse dependency index.
//!
//! Maps every file reachable from a root to the set of roots that include it.
//! A root is never a member of its own bucket, so a change to a root path must
//! be matched against the component registry first.
//!
//! The index is patched in place when a file's imports change: only roots
//! whose closure contains that file are recomputed.

use std::fmt::Write as _;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{DependencyQuery, DependencyTree, GraphError};
use crate::utils::path::normalize_source_path;

type PathSet = FxHashSet<String>;

/// Dependency path → dependent roots.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    tree: DependencyTree,
    /// Dependency → roots that reach it.
    reverse: FxHashMap<String, PathSet>,
    /// Root → everything it reaches.
    closures: FxHashMap<String, PathSet>,
}

impl SourceMap {
    /// Build the forest for the roots under `dir`, then index it.
    pub fn build(query: &dyn DependencyQuery, dir: &str) -> Result<Self, GraphError> {
        DependencyTree::build(query, dir).map(Self::from_tree)
    }

    /// Index an already-built forest.
    pub fn from_tree(tree: DependencyTree) -> Self {
        let mut map = Self {
            tree,
            ..Self::default()
        };
        let roots = map.tree.roots().to_vec();
        for root in &roots {
            map.reindex_root(root);
        }
        map
    }

    /// Roots whose build includes `path`, sorted.
    pub fn find_roots(&self, path: &str) -> Vec<String> {
        let path = normalize_source_path(path);
        let mut roots: Vec<String> = self
            .reverse
            .get(&path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        roots.sort();
        roots
    }

    /// Number of indexed dependency paths.
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    pub fn tree(&self) -> &DependencyTree {
        &self.tree
    }

    /// Replace the immediate dependencies of `path` and re-index every root
    /// that reaches it.
    ///
    /// On error neither the forest nor the index changes.
    pub fn update_dependencies(
        &mut self,
        query: &dyn DependencyQuery,
        path: &str,
        dependencies: Vec<String>,
    ) -> Result<(), GraphError> {
        let path = normalize_source_path(path);
        let mut affected: Vec<String> = self.reverse.get(&path).into_iter().flatten().cloned().collect();
        if self.tree.roots().iter().any(|r| *r == path) {
            affected.push(path.clone());
        }

        self.tree.set_children(query, &path, dependencies)?;

        for root in &affected {
            self.reindex_root(root);
        }
        Ok(())
    }

    /// Re-query the imports of `path` and patch the index.
    pub fn refresh(&mut self, query: &dyn DependencyQuery, path: &str) -> Result<(), GraphError> {
        let dependencies = query.path_dependencies(path)?;
        self.update_dependencies(query, path, dependencies)
    }

    /// Union with another snapshot. Buckets are deduplicated.
    pub fn merge(&mut self, other: SourceMap) {
        self.tree.merge(other.tree);
        for (path, roots) in other.reverse {
            self.reverse.entry(path).or_default().extend(roots);
        }
        for (root, closure) in other.closures {
            self.closures.entry(root).or_default().extend(closure);
        }
    }

    /// Write `mode: graph` followed by one `dependency root` line per edge.
    pub fn write(&self, path: &Path) -> Result<(), GraphError> {
        let io_err = |source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.render()).map_err(io_err)
    }

    fn render(&self) -> String {
        let mut deps: Vec<&String> = self.reverse.keys().collect();
        deps.sort();

        let mut out = String::from("mode: graph\n");
        for dep in deps {
            for root in self.find_roots(dep) {
                let _ = writeln!(out, "{dep} {root}");
            }
        }
        out
    }

    fn reindex_root(&mut self, root: &str) {
        if let Some(old) = self.closures.remove(root) {
            for dep in old {
                if let Some(roots) = self.reverse.get_mut(&dep) {
                    roots.remove(root);
                    if roots.is_empty() {
                        self.reverse.remove(&dep);
                    }
                }
            }
        }

        let closure = self.tree.closure(root);
        for dep in &closure {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(root.to_string());
        }
        self.closures.insert(root.to_string(), closure);
    }
}
