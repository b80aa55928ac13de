//! Hooks around each pack and repack.

use std::time::{Duration, Instant};

use crate::logger::Logger;
use crate::{debug, log};

/// Observes the start and end of each component pack.
///
/// `post` runs after the pack has returned, whether it succeeded or not.
pub trait PackHook: Send + Sync {
    fn pre(&self, _path: &str) {}

    fn post(&self, _path: &str, _elapsed: Duration) {}
}

/// Run `f` between `hook.pre` and `hook.post` for `path`.
pub fn with_hook<T>(hook: &dyn PackHook, path: &str, f: impl FnOnce() -> T) -> T {
    hook.pre(path);
    let start = Instant::now();
    let out = f();
    hook.post(path, start.elapsed());
    out
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl PackHook for NoopHook {}

/// Logs `path - 0.4s` after each pack.
#[derive(Debug, Clone)]
pub struct TimingHook {
    logger: Logger,
}

impl TimingHook {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl PackHook for TimingHook {
    fn pre(&self, path: &str) {
        debug!(self.logger, "pack"; "bundling {path}");
    }

    fn post(&self, path: &str, elapsed: Duration) {
        log!(self.logger, "pack"; "{path} - {:.1}s", elapsed.as_secs_f64());
    }
}
