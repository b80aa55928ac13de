//! Dependency queries.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::GraphError;
use crate::parse::SourceParser;
use crate::utils::path::normalize_source_path;

/// The two lookups graph construction needs.
pub trait DependencyQuery: Send + Sync {
    /// Root paths to build the graph from.
    fn dir_list(&self, path: &str) -> Result<Vec<String>, GraphError>;

    /// Local dependencies of `path`, normalized.
    fn path_dependencies(&self, path: &str) -> Result<Vec<String>, GraphError>;
}

/// Query backed by already-packed roots, falling back to the parser.
///
/// Roots answer from their cached import lists; any other page source is
/// parsed on demand. Files the parser does not understand (stylesheets,
/// images) have no dependencies.
pub struct ParserQuery {
    roots: Vec<String>,
    cached: FxHashMap<String, Vec<String>>,
    parser: Arc<dyn SourceParser>,
}

impl ParserQuery {
    /// Build from `(root path, local dependencies)` pairs.
    pub fn new<I>(parser: Arc<dyn SourceParser>, roots: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut list = Vec::new();
        let mut cached = FxHashMap::default();
        for (path, deps) in roots {
            let path = normalize_source_path(&path);
            list.push(path.clone());
            cached.insert(path, deps);
        }

        Self {
            roots: list,
            cached,
            parser,
        }
    }

    /// Query that always parses.
    pub fn uncached(parser: Arc<dyn SourceParser>, roots: Vec<String>) -> Self {
        Self {
            roots: roots.iter().map(|p| normalize_source_path(p)).collect(),
            cached: FxHashMap::default(),
            parser,
        }
    }
}

impl DependencyQuery for ParserQuery {
    fn dir_list(&self, _path: &str) -> Result<Vec<String>, GraphError> {
        Ok(self.roots.clone())
    }

    fn path_dependencies(&self, path: &str) -> Result<Vec<String>, GraphError> {
        let path = normalize_source_path(path);
        if let Some(deps) = self.cached.get(&path) {
            return Ok(deps.clone());
        }

        if !self.parser.can_parse(&path) {
            return Ok(Vec::new());
        }

        self.parser
            .parse(&path)
            .map(|doc| doc.local_dependencies())
            .map_err(|source| GraphError::Dependencies { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ImportDependency, PageDocument, ParseError};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingParser {
        calls: Mutex<Vec<String>>,
    }

    impl SourceParser for CountingParser {
        fn parse(&self, path: &str) -> Result<PageDocument, ParseError> {
            self.calls.lock().push(path.to_string());
            match path {
                "components/button.jsx" => Ok(PageDocument::new(
                    "Button",
                    vec![
                        ImportDependency::external("react"),
                        ImportDependency::local("components/icon.jsx"),
                    ],
                    "",
                )),
                _ => Err(ParseError::InvalidUtf8(path.to_string())),
            }
        }
    }

    #[test]
    fn roots_answer_from_cache() {
        let parser = Arc::new(CountingParser::default());
        let query = ParserQuery::new(
            parser.clone(),
            [("./pages/home.jsx".to_string(), vec!["components/button.jsx".to_string()])],
        );

        assert_eq!(query.dir_list("pages").unwrap(), vec!["pages/home.jsx"]);
        assert_eq!(
            query.path_dependencies("pages/home.jsx").unwrap(),
            vec!["components/button.jsx"]
        );
        assert!(parser.calls.lock().is_empty());
    }

    #[test]
    fn other_sources_are_parsed() {
        let parser = Arc::new(CountingParser::default());
        let query = ParserQuery::uncached(parser.clone(), Vec::new());

        assert_eq!(
            query.path_dependencies("components/button.jsx").unwrap(),
            vec!["components/icon.jsx"]
        );
        assert_eq!(*parser.calls.lock(), vec!["components/button.jsx"]);
    }

    #[test]
    fn non_source_files_have_no_dependencies() {
        let parser = Arc::new(CountingParser::default());
        let query = ParserQuery::uncached(parser.clone(), Vec::new());

        assert!(query.path_dependencies("styles/site.css").unwrap().is_empty());
        assert!(parser.calls.lock().is_empty());
    }

    #[test]
    fn parse_failure_carries_path() {
        let query = ParserQuery::uncached(Arc::new(CountingParser::default()), Vec::new());
        let err = query.path_dependencies("components/broken.jsx").unwrap_err();
        assert!(matches!(err, GraphError::Dependencies { ref path, .. } if path == "components/broken.jsx"));
    }
}
