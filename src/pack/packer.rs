//! Concurrent packing of many pages.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::hook::{NoopHook, PackHook, with_hook};
use super::{Component, PackError, PackPipeline};
use crate::utils::path::normalize_source_path;

/// Packed components, in path order.
#[derive(Debug, Clone, Default)]
pub struct ComponentList(Vec<Arc<Component>>);

impl ComponentList {
    pub fn new(mut components: Vec<Arc<Component>>) -> Self {
        components.sort_by(|a, b| a.original_path().cmp(b.original_path()));
        Self(components)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Arc<Component>] {
        &self.0
    }

    /// Repack every component concurrently, collecting all failures.
    pub fn repack_many(&self, hook: &dyn PackHook) -> Result<(), PackError> {
        repack_many(&self.0, hook)
    }

    /// Write `audit: components` followed by one `name bundle_key` line each.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut out = String::from("audit: components\n");
        for component in &self.0 {
            let _ = writeln!(out, "{} {}", component.name(), component.bundle_key());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, out)
    }

    /// Write `keys: bundles` followed by one `path bundle_key` line each.
    ///
    /// Read back with [`read_bundle_keys`] to keep keys stable across runs.
    pub fn write_keys(&self, path: &Path) -> std::io::Result<()> {
        let mut out = String::from("keys: bundles\n");
        for component in &self.0 {
            let _ = writeln!(out, "{} {}", component.original_path(), component.bundle_key());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, out)
    }
}

/// Path → bundle key from a file written by [`ComponentList::write_keys`].
///
/// Malformed lines are skipped.
pub fn read_bundle_keys(path: &Path) -> std::io::Result<FxHashMap<String, String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .skip_while(|line| line.starts_with("keys:"))
        .filter_map(|line| line.split_once(' '))
        .filter(|(_, key)| !key.is_empty() && !key.contains(' '))
        .map(|(path, key)| (normalize_source_path(path), key.to_string()))
        .collect())
}

impl IntoIterator for ComponentList {
    type Item = Arc<Component>;
    type IntoIter = std::vec::IntoIter<Arc<Component>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// `pack_many` stopped at a failure.
#[derive(Debug, Error)]
#[error("packed {} of {total} pages before failing", .packed.len())]
pub struct PartialPack {
    /// Components packed before the failure was observed.
    pub packed: ComponentList,
    pub total: usize,
    #[source]
    pub source: PackError,
}

/// Packs page sources into components.
pub trait Packer: Send + Sync {
    /// Pack every page concurrently.
    ///
    /// Two pages exporting the same name yield one component: the first to
    /// finish wins. The first failure stops the run.
    fn pack_many(&self, pages: &[String]) -> Result<ComponentList, PartialPack>;

    /// Pack one page.
    fn pack_single(&self, page: &str) -> Result<Arc<Component>, PackError>;
}

/// Default packer over a [`PackPipeline`].
pub struct JsPacker {
    pipeline: Arc<PackPipeline>,
    /// Path → bundle key carried over from a previous run.
    cached_keys: FxHashMap<String, String>,
    hook: Arc<dyn PackHook>,
}

impl JsPacker {
    pub fn new(pipeline: Arc<PackPipeline>) -> Self {
        Self {
            pipeline,
            cached_keys: FxHashMap::default(),
            hook: Arc::new(NoopHook),
        }
    }

    pub fn with_cached_keys(mut self, keys: FxHashMap<String, String>) -> Self {
        self.cached_keys = keys
            .into_iter()
            .map(|(path, key)| (normalize_source_path(&path), key))
            .collect();
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn PackHook>) -> Self {
        self.hook = hook;
        self
    }

    fn pack(&self, path: &str) -> Result<Component, PackError> {
        let start = Instant::now();
        let key = self.cached_keys.get(path).map(String::as_str);
        let packed = self.pipeline.run(path, key)?;
        Ok(Component::new(
            path.to_string(),
            packed,
            start.elapsed(),
            self.pipeline.clone(),
        ))
    }
}

/// Dedup state shared by the workers of one `pack_many`.
#[derive(Default)]
struct Collected {
    names: FxHashSet<String>,
    components: Vec<Arc<Component>>,
}

impl Packer for JsPacker {
    fn pack_many(&self, pages: &[String]) -> Result<ComponentList, PartialPack> {
        let mut seen = FxHashSet::default();
        let pages: Vec<String> = pages
            .iter()
            .map(|p| normalize_source_path(p))
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let collected = Mutex::new(Collected::default());
        let result = pages.par_iter().try_for_each(|path| {
            let component = with_hook(self.hook.as_ref(), path, || self.pack(path))?;

            let mut collected = collected.lock();
            if collected.names.insert(component.name().to_string()) {
                collected.components.push(Arc::new(component));
            }
            Ok(())
        });

        let packed = ComponentList::new(collected.into_inner().components);
        match result {
            Ok(()) => Ok(packed),
            Err(source) => Err(PartialPack {
                packed,
                total: pages.len(),
                source,
            }),
        }
    }

    fn pack_single(&self, page: &str) -> Result<Arc<Component>, PackError> {
        let path = normalize_source_path(page);
        with_hook(self.hook.as_ref(), &path, || self.pack(&path)).map(Arc::new)
    }
}

/// Repack `components` concurrently and wait for all of them.
///
/// Every failure is kept: one failure is returned as is, several as
/// [`PackError::Many`].
pub fn repack_many(components: &[Arc<Component>], hook: &dyn PackHook) -> Result<(), PackError> {
    let errors: Vec<PackError> = components
        .par_iter()
        .filter_map(|component| {
            with_hook(hook, component.original_path(), || component.repack()).err()
        })
        .collect();

    PackError::collect(errors)
}
