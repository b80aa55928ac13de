//! Project configuration management for `pagepack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/   # [build] and [dev]
//! ├── error      # ConfigError
//! ├── util       # Config file discovery
//! └── mod.rs     # PackConfig (this file)
//! ```
//!
//! A missing config file means all defaults, rooted at the working directory.
//! The loaded value is passed around explicitly as `Arc<PackConfig>`.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{BuildConfig, DevConfig};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use util::find_config_file;

use crate::logger::Logger;
use crate::{debug, log};

/// Root configuration structure representing pagepack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

impl PackConfig {
    /// Find `config_name` upward from the working directory and load it.
    pub fn load(config_name: &Path, logger: &Logger) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;

        let mut config = match find_config_file(config_name) {
            Some(path) => {
                let mut config = Self::from_path(&path, logger)?;
                config.config_path = path;
                config
            }
            None => {
                debug!(logger, "config"; "no {}, using defaults", config_name.display());
                Self {
                    config_path: cwd.join(config_name),
                    ..Self::default()
                }
            }
        };

        config.root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.finalize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path, logger: &Logger) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!(logger, "config"; "unknown fields in {}, ignoring: {}", name, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Anchor `web_dir` at the project root.
    fn finalize(&mut self) -> Result<(), ConfigError> {
        let web_dir = self.root.join(&self.build.web_dir);
        self.build.web_dir =
            std::path::absolute(&web_dir).map_err(|err| ConfigError::Io(web_dir, err))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dev = &self.dev;
        if dev.watch_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "dev.watch_interval_ms must be greater than 0".into(),
            ));
        }
        if dev.change_retention_ms < dev.debounce_ms {
            return Err(ConfigError::Validation(format!(
                "dev.change_retention_ms ({}) must not be shorter than dev.debounce_ms ({})",
                dev.change_retention_ms, dev.debounce_ms
            )));
        }
        if self.build.pages_dir.is_absolute() || self.build.out_dir.is_absolute() {
            return Err(ConfigError::Validation(
                "build.pages_dir and build.out_dir must be relative to build.web_dir".into(),
            ));
        }
        Ok(())
    }

    /// Where to dump the dependency graph after each accepted change.
    pub fn dep_out(&self) -> Option<PathBuf> {
        let dep_out = &self.dev.dep_out;
        (!dep_out.as_os_str().is_empty()).then(|| self.root.join(dep_out))
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> PackConfig {
    let (parsed, ignored) = PackConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
