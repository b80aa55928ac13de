//! Parse → wrap → bundle for a single page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::PackError;
use crate::bundler::{BundleError, BundleRequest, Bundler, WebWrapper};
use crate::core::CancelToken;
use crate::parse::{ImportDependency, SourceParser};
use crate::utils::path::normalize_source_path;

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPage {
    pub name: String,
    pub bundle_key: String,
    pub dependencies: Vec<ImportDependency>,
}

/// Shared collaborators of every pack and repack.
///
/// The cancel token is checked between stages; a cancelled run leaves any
/// previously written files in place and reports [`PackError::Cancelled`].
pub struct PackPipeline {
    web_dir: PathBuf,
    parser: Arc<dyn SourceParser>,
    wrapper: Arc<dyn WebWrapper>,
    bundler: Arc<dyn Bundler>,
    cancel: CancelToken,
}

impl PackPipeline {
    pub fn new(
        web_dir: impl Into<PathBuf>,
        parser: Arc<dyn SourceParser>,
        wrapper: Arc<dyn WebWrapper>,
        bundler: Arc<dyn Bundler>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            web_dir: web_dir.into(),
            parser,
            wrapper,
            bundler,
            cancel,
        }
    }

    /// Pack `path`. `bundle_key` overrides the key derived from the page name.
    pub fn run(&self, path: &str, bundle_key: Option<&str>) -> Result<PackedPage, PackError> {
        let path = normalize_source_path(path);
        self.checkpoint(&path)?;

        let page = self.parser.parse(&path).map_err(|source| PackError::Parse {
            path: path.clone(),
            source,
        })?;
        self.checkpoint(&path)?;

        let entry = self
            .wrapper
            .apply(&page, &path, &self.web_dir.join(&path))
            .map_err(|source| PackError::Parse {
                path: path.clone(),
                source,
            })?;

        let bundle_key = bundle_key.map_or_else(|| page.key(), str::to_string);
        let bundle_err = |source| PackError::Bundle {
            path: path.clone(),
            source,
        };

        let resource = self
            .bundler
            .setup(&BundleRequest {
                name: page.name().to_string(),
                bundle_key: bundle_key.clone(),
                source_path: path.clone(),
            })
            .map_err(bundle_err)?;
        self.checkpoint(&path)?;

        write_file(&resource.entry_path, &entry).map_err(bundle_err)?;
        write_file(&resource.config_path, &resource.config_source).map_err(bundle_err)?;
        self.checkpoint(&path)?;

        self.bundler.bundle(&resource).map_err(bundle_err)?;

        Ok(PackedPage {
            name: page.name().to_string(),
            bundle_key,
            dependencies: page.imports().to_vec(),
        })
    }

    fn checkpoint(&self, path: &str) -> Result<(), PackError> {
        if self.cancel.is_cancelled() {
            return Err(PackError::Cancelled(path.to_string()));
        }
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), BundleError> {
    let io_err = |source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
