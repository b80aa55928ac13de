//! Bundler interface.
//!
//! A bundler turns one transformed page entry into a deployable artifact.
//! The work is split in two steps:
//!
//! - [`Bundler::setup`] describes where the entry and the bundler config go
//!   and what the config contains (no I/O)
//! - [`Bundler::bundle`] runs the external bundler once both files exist
//!
//! [`WebWrapper`] is the source-to-target transform applied to a parsed page
//! before its entry file is written.

mod webpack;
mod wrap;

pub use webpack::WebpackBundler;
pub use wrap::{ReactCsrWrapper, WebWrapper};

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::exec::ExecError;

/// Bundler failures.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to write `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bundler failed for `{}`", .config.display())]
    Process {
        config: PathBuf,
        #[source]
        source: ExecError,
    },
}

/// Optimization profile handed to the bundler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BundlerMode {
    #[default]
    Development,
    Production,
}

impl BundlerMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for BundlerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Exported component name.
    pub name: String,
    pub bundle_key: String,
    /// Normalized project-relative path of the page source.
    pub source_path: String,
}

/// Files a bundler run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResource {
    /// Where the transformed page entry is written.
    pub entry_path: PathBuf,
    /// Where the bundler configuration is written.
    pub config_path: PathBuf,
    /// Bundler configuration contents.
    pub config_source: String,
}

/// External bundler.
pub trait Bundler: Send + Sync {
    /// Describe the entry and configuration files for `request`.
    fn setup(&self, request: &BundleRequest) -> Result<BundleResource, BundleError>;

    /// Run the bundler over files previously described by [`Bundler::setup`].
    fn bundle(&self, resource: &BundleResource) -> Result<(), BundleError>;
}
