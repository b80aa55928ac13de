//! `[build]` section configuration.
//!
//! Paths for packing. `web_dir` is relative to the config file's directory;
//! every other path is relative to `web_dir`.
//!
//! # Example
//!
//! ```toml
//! [build]
//! web_dir = "."                 # Root of the page sources
//! pages_dir = "pages"           # Root pages, one component each
//! out_dir = ".orbit"            # Generated entries, configs and bundles
//! node_modules = "node_modules" # Where the webpack binary lives
//! mode = "development"          # development | production
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bundler::BundlerMode;

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub web_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub out_dir: PathBuf,
    pub node_modules: PathBuf,
    pub mode: BundlerMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            web_dir: PathBuf::from("."),
            pages_dir: PathBuf::from("pages"),
            out_dir: PathBuf::from(".orbit"),
            node_modules: PathBuf::from("node_modules"),
            mode: BundlerMode::Development,
        }
    }
}

impl BuildConfig {
    pub fn pages_dir(&self) -> PathBuf {
        self.web_dir.join(&self.pages_dir)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.web_dir.join(&self.out_dir)
    }

    pub fn node_modules(&self) -> PathBuf {
        self.web_dir.join(&self.node_modules)
    }
}
