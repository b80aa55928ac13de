//! `[dev]` section configuration.
//!
//! Watch mode timing and the hot reload port.
//!
//! # Example
//!
//! ```toml
//! [dev]
//! port = 3005                 # Hot reload websocket port (next free port if taken)
//! debounce_ms = 2000          # Minimum time between two rebuilds of one path
//! watch_interval_ms = 2000    # Sleep between watch loop ticks
//! recent_build_ttl_ms = 5000  # Navigation skips bundles built this recently
//! change_retention_ms = 60000 # How long accepted changes are remembered
//! dep_out = ""                # Rewrite the dependency graph here after each change
//! ignore = [".orbit/", "node_modules/", ".git/"]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Development session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub port: u16,
    pub debounce_ms: u64,
    pub watch_interval_ms: u64,
    pub recent_build_ttl_ms: u64,
    pub change_retention_ms: u64,
    /// Empty disables the graph dump.
    pub dep_out: PathBuf,
    /// Path fragments never handed to the session.
    pub ignore: Vec<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: 3005,
            debounce_ms: 2000,
            watch_interval_ms: 2000,
            recent_build_ttl_ms: 5000,
            change_retention_ms: 60_000,
            dep_out: PathBuf::new(),
            ignore: vec![
                ".orbit/".to_string(),
                "node_modules/".to_string(),
                ".git/".to_string(),
            ],
        }
    }
}

impl DevConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    pub fn recent_build_ttl(&self) -> Duration {
        Duration::from_millis(self.recent_build_ttl_ms)
    }

    pub fn change_retention(&self) -> Duration {
        Duration::from_millis(self.change_retention_ms)
    }
}
