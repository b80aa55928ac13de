//! Packed root page.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{PackError, PackPipeline, PackedPage};
use crate::parse::{self, ImportDependency};

/// State replaced by each successful repack.
#[derive(Debug, Clone, Default)]
struct PackState {
    dependencies: Vec<ImportDependency>,
    last_pack_duration: Duration,
}

/// One root page and its bundle.
///
/// `name`, `bundle_key` and `original_path` are fixed at first pack. The
/// state lock is held for a whole repack, so repacks of the same component
/// serialize while different components rebuild in parallel.
pub struct Component {
    name: String,
    bundle_key: String,
    original_path: String,
    state: Mutex<PackState>,
    pipeline: Arc<PackPipeline>,
}

impl Component {
    pub(super) fn new(
        original_path: String,
        packed: PackedPage,
        duration: Duration,
        pipeline: Arc<PackPipeline>,
    ) -> Self {
        Self {
            name: packed.name,
            bundle_key: packed.bundle_key,
            original_path,
            state: Mutex::new(PackState {
                dependencies: packed.dependencies,
                last_pack_duration: duration,
            }),
            pipeline,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bundle_key(&self) -> &str {
        &self.bundle_key
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    /// Imports from the last successful parse.
    pub fn dependencies(&self) -> Vec<ImportDependency> {
        self.state.lock().dependencies.clone()
    }

    /// Local import paths from the last successful parse.
    pub fn local_dependencies(&self) -> Vec<String> {
        parse::local_dependencies(&self.state.lock().dependencies)
    }

    pub fn last_pack_duration(&self) -> Duration {
        self.state.lock().last_pack_duration
    }

    /// Re-run parse → wrap → bundle under the existing bundle key.
    ///
    /// On failure the previous dependencies and duration are kept.
    pub fn repack(&self) -> Result<(), PackError> {
        let mut state = self.state.lock();
        let start = Instant::now();

        let packed = self.pipeline.run(&self.original_path, Some(&self.bundle_key))?;

        state.dependencies = packed.dependencies;
        state.last_pack_duration = start.elapsed();
        Ok(())
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("bundle_key", &self.bundle_key)
            .field("original_path", &self.original_path)
            .finish_non_exhaustive()
    }
}
