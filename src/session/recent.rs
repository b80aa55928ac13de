use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Bundle keys rebuilt within the last `ttl`.
///
/// Read by the redirection bundler to skip pages that are already fresh.
#[derive(Debug)]
pub struct RecentBuilds {
    ttl: Duration,
    built: DashMap<String, Instant>,
}

impl RecentBuilds {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            built: DashMap::new(),
        }
    }

    pub fn mark(&self, bundle_key: &str) {
        self.built.insert(bundle_key.to_string(), Instant::now());
    }

    /// Whether `bundle_key` was built within the TTL. Expired entries are dropped.
    pub fn is_fresh(&self, bundle_key: &str) -> bool {
        let fresh = self
            .built
            .get(bundle_key)
            .is_some_and(|at| at.elapsed() < self.ttl);
        if !fresh {
            self.built.remove(bundle_key);
        }
        fresh
    }

    /// Force the next request for `bundle_key` to rebuild.
    pub fn invalidate(&self, bundle_key: &str) {
        self.built.remove(bundle_key);
    }
}
