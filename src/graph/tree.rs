//! Forward dependency forest.
//!
//! Each visited path maps to its immediate local dependencies. Every path is
//! queried once. An import that points back to a path still being expanded on
//! the current branch closes a cycle: the edge is kept but not followed, and
//! recorded in [`DependencyTree::cycles`].

use rustc_hash::{FxHashMap, FxHashSet};

use super::{DependencyQuery, GraphError};

/// Adjacency forest rooted at the page roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree {
    roots: Vec<String>,
    edges: FxHashMap<String, Vec<String>>,
    /// `(importer, imported)` edges that close a cycle.
    cycles: Vec<(String, String)>,
}

impl DependencyTree {
    /// Build from the roots the query lists under `dir`.
    ///
    /// Any query failure aborts construction.
    pub fn build(query: &dyn DependencyQuery, dir: &str) -> Result<Self, GraphError> {
        let roots = query.dir_list(dir)?;
        Self::from_roots(query, roots)
    }

    /// Build from an explicit root list.
    pub fn from_roots(query: &dyn DependencyQuery, roots: Vec<String>) -> Result<Self, GraphError> {
        let mut tree = Self::default();
        for root in &roots {
            tree.expand(query, root)?;
        }
        tree.roots = roots;
        Ok(tree)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Immediate dependencies of `path` (empty when unknown).
    pub fn children(&self, path: &str) -> &[String] {
        self.edges.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn cycles(&self) -> &[(String, String)] {
        &self.cycles
    }

    /// Every path reachable from `root`, excluding `root` itself.
    pub fn closure(&self, root: &str) -> FxHashSet<String> {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<&str> = self.children(root).iter().map(String::as_str).collect();

        while let Some(path) = stack.pop() {
            if path == root || !seen.insert(path.to_string()) {
                continue;
            }
            stack.extend(self.children(path).iter().map(String::as_str));
        }

        seen
    }

    /// Expand `path` and every dependency not yet known.
    pub fn expand(&mut self, query: &dyn DependencyQuery, path: &str) -> Result<(), GraphError> {
        let mut on_stack = FxHashSet::default();
        self.expand_branch(query, path, &mut on_stack)
    }

    /// Replace the immediate dependencies of `path`, expanding new ones.
    ///
    /// The new edges are committed only once every child expanded; on error
    /// `path` keeps its previous dependencies.
    pub fn set_children(
        &mut self,
        query: &dyn DependencyQuery,
        path: &str,
        children: Vec<String>,
    ) -> Result<(), GraphError> {
        let children: Vec<String> = children.into_iter().filter(|c| c != path).collect();
        for child in &children {
            self.expand(query, child)?;
        }

        self.edges.insert(path.to_string(), children);
        Ok(())
    }

    /// Union with `other`; on overlap, `self`'s edges win.
    pub fn merge(&mut self, other: DependencyTree) {
        for root in other.roots {
            if !self.roots.contains(&root) {
                self.roots.push(root);
            }
        }
        for (path, children) in other.edges {
            self.edges.entry(path).or_insert(children);
        }
        self.cycles.extend(other.cycles);
    }

    fn expand_branch(
        &mut self,
        query: &dyn DependencyQuery,
        path: &str,
        on_stack: &mut FxHashSet<String>,
    ) -> Result<(), GraphError> {
        if self.edges.contains_key(path) {
            return Ok(());
        }

        on_stack.insert(path.to_string());
        let mut children = Vec::new();

        for child in query.path_dependencies(path)? {
            if on_stack.contains(&child) {
                self.cycles.push((path.to_string(), child.clone()));
            } else {
                self.expand_branch(query, &child, on_stack)?;
            }
            children.push(child);
        }

        on_stack.remove(path);
        self.edges.insert(path.to_string(), children);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseError;
    use parking_lot::Mutex;

    /// Static adjacency query recording how often each path is asked for.
    #[derive(Default)]
    struct MapQuery {
        roots: Vec<String>,
        edges: FxHashMap<String, Vec<String>>,
        calls: Mutex<FxHashMap<String, usize>>,
    }

    impl MapQuery {
        fn new(roots: &[&str], edges: &[(&str, &[&str])]) -> Self {
            Self {
                roots: roots.iter().map(|s| s.to_string()).collect(),
                edges: edges
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                    .collect(),
                calls: Mutex::default(),
            }
        }
    }

    impl DependencyQuery for MapQuery {
        fn dir_list(&self, _path: &str) -> Result<Vec<String>, GraphError> {
            Ok(self.roots.clone())
        }

        fn path_dependencies(&self, path: &str) -> Result<Vec<String>, GraphError> {
            *self.calls.lock().entry(path.to_string()).or_default() += 1;
            if path == "broken.jsx" {
                return Err(GraphError::Dependencies {
                    path: path.to_string(),
                    source: ParseError::InvalidUtf8(path.to_string()),
                });
            }
            Ok(self.edges.get(path).cloned().unwrap_or_default())
        }
    }

    fn sorted(set: FxHashSet<String>) -> Vec<String> {
        let mut v: Vec<_> = set.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn builds_transitive_closure() {
        let query = MapQuery::new(
            &["pages/home.jsx"],
            &[
                ("pages/home.jsx", &["components/button.jsx", "components/nav.jsx"]),
                ("components/button.jsx", &["components/icon.jsx"]),
            ],
        );
        let tree = DependencyTree::build(&query, "pages").unwrap();

        assert_eq!(tree.roots(), ["pages/home.jsx"]);
        assert_eq!(
            sorted(tree.closure("pages/home.jsx")),
            vec!["components/button.jsx", "components/icon.jsx", "components/nav.jsx"]
        );
    }

    #[test]
    fn shared_dependencies_are_queried_once() {
        let query = MapQuery::new(
            &["pages/home.jsx", "pages/about.jsx"],
            &[
                ("pages/home.jsx", &["components/button.jsx"]),
                ("pages/about.jsx", &["components/button.jsx"]),
                ("components/button.jsx", &["components/icon.jsx"]),
            ],
        );
        DependencyTree::build(&query, "pages").unwrap();

        assert_eq!(query.calls.lock()["components/button.jsx"], 1);
    }

    #[test]
    fn cycles_terminate_and_are_recorded() {
        let query = MapQuery::new(
            &["pages/home.jsx"],
            &[
                ("pages/home.jsx", &["a.jsx"]),
                ("a.jsx", &["b.jsx"]),
                ("b.jsx", &["a.jsx", "pages/home.jsx"]),
            ],
        );
        let tree = DependencyTree::build(&query, "pages").unwrap();

        assert_eq!(sorted(tree.closure("pages/home.jsx")), vec!["a.jsx", "b.jsx"]);
        assert_eq!(tree.cycles().len(), 2);
    }

    #[test]
    fn self_import_is_a_cycle() {
        let query = MapQuery::new(&["a.jsx"], &[("a.jsx", &["a.jsx"])]);
        let tree = DependencyTree::build(&query, ".").unwrap();

        assert!(tree.closure("a.jsx").is_empty());
        assert_eq!(tree.cycles(), [("a.jsx".to_string(), "a.jsx".to_string())]);
    }

    #[test]
    fn cycle_members_keep_their_edges_for_later_roots() {
        let query = MapQuery::new(
            &["pages/a.jsx", "pages/b.jsx"],
            &[
                ("pages/a.jsx", &["x.jsx"]),
                ("x.jsx", &["y.jsx"]),
                ("y.jsx", &["x.jsx"]),
                ("pages/b.jsx", &["y.jsx"]),
            ],
        );
        let tree = DependencyTree::build(&query, "pages").unwrap();

        assert_eq!(tree.children("y.jsx"), ["x.jsx"]);
        assert_eq!(sorted(tree.closure("pages/b.jsx")), vec!["x.jsx", "y.jsx"]);
        assert_eq!(tree.cycles(), [("y.jsx".to_string(), "x.jsx".to_string())]);
    }

    #[test]
    fn query_failure_aborts_build() {
        let query = MapQuery::new(
            &["pages/home.jsx"],
            &[("pages/home.jsx", &["components/ok.jsx", "broken.jsx"])],
        );
        assert!(DependencyTree::build(&query, "pages").is_err());
    }

    #[test]
    fn set_children_expands_new_dependencies() {
        let query = MapQuery::new(
            &["pages/home.jsx"],
            &[("components/card.jsx", &["components/title.jsx"])],
        );
        let mut tree = DependencyTree::build(&query, "pages").unwrap();
        assert!(tree.closure("pages/home.jsx").is_empty());

        tree.set_children(&query, "pages/home.jsx", vec!["components/card.jsx".into()])
            .unwrap();
        assert_eq!(
            sorted(tree.closure("pages/home.jsx")),
            vec!["components/card.jsx", "components/title.jsx"]
        );
    }

    #[test]
    fn failed_set_children_keeps_previous_edges() {
        let query = MapQuery::new(
            &["pages/home.jsx"],
            &[("pages/home.jsx", &["components/nav.jsx"])],
        );
        let mut tree = DependencyTree::build(&query, "pages").unwrap();

        let result = tree.set_children(&query, "pages/home.jsx", vec!["broken.jsx".into()]);
        assert!(result.is_err());
        assert_eq!(tree.children("pages/home.jsx"), ["components/nav.jsx"]);
    }
}
