//! Dependency graph between page roots and the files they import.
//!
//! - [`DependencyQuery`]: lazily answers "which roots" and "what does this
//!   file import"
//! - [`DependencyTree`]: forward adjacency built from the query, cycle-guarded
//! - [`SourceMap`]: reverse index from any file to the roots that include it

mod query;
mod source_map;
mod tree;

pub use query::{DependencyQuery, ParserQuery};
pub use source_map::SourceMap;
pub use tree::DependencyTree;

use std::path::PathBuf;

use thiserror::Error;

use crate::parse::ParseError;

/// Graph construction and persistence failures.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to list roots under `{0}`")]
    DirList(String),

    #[error("failed to resolve dependencies of `{path}`")]
    Dependencies {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to write dependency graph to `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
