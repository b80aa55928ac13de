use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

/// Per-path record of the last accepted change.
///
/// Pure timing: no locking and no clock access, callers pass `now`.
/// Entries older than `retention` are evicted whenever a change is recorded.
#[derive(Debug)]
pub(super) struct ChangeLog {
    retention: Duration,
    entries: FxHashMap<String, Instant>,
}

impl ChangeLog {
    pub(super) fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: FxHashMap::default(),
        }
    }

    /// Whether `path` was accepted less than `window` before `now`.
    pub(super) fn is_recent(&self, path: &str, now: Instant, window: Duration) -> bool {
        self.entries
            .get(path)
            .is_some_and(|&at| now.saturating_duration_since(at) < window)
    }

    pub(super) fn record(&mut self, path: &str, now: Instant) {
        let retention = self.retention;
        self.entries
            .retain(|_, at| now.saturating_duration_since(*at) <= retention);
        self.entries.insert(path.to_string(), now);
    }

    /// Undo `record(path, at)` unless a later change replaced it.
    pub(super) fn forget(&mut self, path: &str, at: Instant) {
        if self.entries.get(path) == Some(&at) {
            self.entries.remove(path);
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}
