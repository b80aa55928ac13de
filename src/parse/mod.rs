//! Page source parsing.
//!
//! The engine only needs three facts about a page source: its exported
//! component name, its import list, and the raw text to hand to the
//! transform step. [`SourceParser`] is the seam; [`JsxParser`] is the
//! built-in implementation for `.jsx`/`.js`/`.tsx`/`.ts` files.

mod jsx;

pub use jsx::JsxParser;

use std::path::PathBuf;

use thiserror::Error;

use crate::utils::{hash, path::is_page_source};

/// Parse failures.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{0}` is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("invalid component in `{path}`: {reason}")]
    InvalidComponent { path: String, reason: String },
}

/// Where an import resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// Another project file, tracked for dependency purposes.
    Local,
    /// A package module, opaque to the engine.
    External,
}

/// One import statement of a page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDependency {
    /// Statement as written in the source.
    pub statement: String,
    /// Normalized project-relative path for local imports, module specifier otherwise.
    pub path: String,
    pub kind: ImportKind,
}

impl ImportDependency {
    pub fn local(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            statement: format!("import '{path}'"),
            path,
            kind: ImportKind::Local,
        }
    }

    pub fn external(module: impl Into<String>) -> Self {
        let path = module.into();
        Self {
            statement: format!("import '{path}'"),
            path,
            kind: ImportKind::External,
        }
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        self.kind == ImportKind::Local
    }
}

/// Parsed page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    name: String,
    imports: Vec<ImportDependency>,
    source: String,
}

impl PageDocument {
    pub fn new(name: impl Into<String>, imports: Vec<ImportDependency>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports,
            source: source.into(),
        }
    }

    /// Exported component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bundle key derived from the component name.
    pub fn key(&self) -> String {
        hash::bundle_key(&self.name)
    }

    pub fn imports(&self) -> &[ImportDependency] {
        &self.imports
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Local import paths, in source order.
    pub fn local_dependencies(&self) -> Vec<String> {
        local_dependencies(&self.imports)
    }
}

/// Extract local import paths from an import list.
pub fn local_dependencies(imports: &[ImportDependency]) -> Vec<String> {
    imports
        .iter()
        .filter(|d| d.is_local())
        .map(|d| d.path.clone())
        .collect()
}

/// Converts a source file into a [`PageDocument`].
pub trait SourceParser: Send + Sync {
    /// Parse the file at a normalized project-relative path.
    fn parse(&self, path: &str) -> Result<PageDocument, ParseError>;

    /// Whether this parser understands the file type.
    fn can_parse(&self, path: &str) -> bool {
        is_page_source(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_dependencies_skip_external() {
        let doc = PageDocument::new(
            "Home",
            vec![
                ImportDependency::external("react"),
                ImportDependency::local("components/button.jsx"),
                ImportDependency::local("components/nav.jsx"),
            ],
            "",
        );

        assert_eq!(
            doc.local_dependencies(),
            vec!["components/button.jsx", "components/nav.jsx"]
        );
    }

    #[test]
    fn key_follows_name() {
        let a = PageDocument::new("Home", Vec::new(), "a");
        let b = PageDocument::new("Home", Vec::new(), "b");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), hash::bundle_key("Home"));
    }
}
