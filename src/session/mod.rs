//! Dev session: the change orchestrator.
//!
//! Every file event is classified against the registered roots and the
//! reverse dependency index:
//!
//! ```text
//! path ──debounced?──> TooRecentlyProcessed
//!   │
//!   ├─ registered root ──> repack, reload its key              (Direct)
//!   ├─ dependency of roots
//!   │     ├─ some displayed ──> repack those, reload them       (Indirect)
//!   │     └─ none displayed ──> repack all, no reload           (Indirect)
//!   ├─ page source under the pages dir ──> pack, register       (NewPage)
//!   └─ otherwise ──> Ignored
//! ```
//!
//! Check, classification and record happen under the change-log lock, so
//! two events for the same path cannot both pass the debounce check.
//! Rebuilds run after the lock is released.

mod debounce;
mod recent;


pub use recent::RecentBuilds;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use self::debounce::ChangeLog;
use crate::graph::{GraphError, ParserQuery, SourceMap};
use crate::logger::Logger;
use crate::pack::{
    Component, ComponentList, ComponentRegistry, PackError, PackHook, Packer, PartialPack,
    repack_many, with_hook,
};
use crate::parse::SourceParser;
use crate::reload::HotReloader;
use crate::utils::path::{is_page_source, normalize_source_path};
use crate::{debug, log};

/// Change request failures.
#[derive(Debug, Error)]
pub enum ChangeError {
    /// Not a failure: the same path was accepted within the debounce window.
    #[error("change not accepted, `{0}` too recently processed")]
    TooRecentlyProcessed(String),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error("no component with bundle key `{0}`")]
    UnknownBundle(String),

    #[error("`{path}` exports `{name}`, already registered by `{existing}`")]
    DuplicatePage {
        path: String,
        name: String,
        existing: String,
    },

    #[error("failed to index new page: {0}")]
    Graph(#[from] GraphError),
}

impl ChangeError {
    /// Whether this is the debounce signal rather than a real failure.
    pub fn is_debounce(&self) -> bool {
        matches!(self, Self::TooRecentlyProcessed(_))
    }

    /// Message shown to the developer, including the underlying causes.
    pub fn detail(&self) -> String {
        match self {
            Self::Pack(e) => e.detail(),
            other => other.to_string(),
        }
    }
}

/// Session bootstrap failures. Both are fatal.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("initial pack failed")]
    Pack(#[from] PartialPack),

    #[error("failed to build the dependency graph")]
    Graph(#[from] GraphError),
}

/// What a change request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Not a root and no root depends on it.
    Ignored,
    /// A root was rebuilt.
    Direct { bundle_key: String },
    /// Dependents were rebuilt; `reloaded` lists the keys signalled.
    Indirect {
        rebuilt: Vec<String>,
        reloaded: Vec<String>,
    },
    /// A page created after bootstrap was packed and registered.
    NewPage { bundle_key: String },
    /// A bundle was rebuilt because the client navigated to it.
    OnDemand { bundle_key: String },
    /// The bundle was rebuilt recently enough to skip.
    Fresh,
}

/// Per-request collaborators.
#[derive(Clone)]
pub struct ChangeRequestOpts {
    /// Minimum time between two accepted changes of the same path.
    pub debounce: Duration,
    pub hot_reload: Arc<dyn HotReloader>,
    /// Runs around each repack.
    pub hook: Arc<dyn PackHook>,
}

/// Session-lifetime settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Eviction horizon of the change log.
    pub change_retention: Duration,
    /// Lifetime of recently-built entries.
    pub recent_build_ttl: Duration,
    /// Rewrite the dependency graph here after each accepted change.
    pub dep_out: Option<PathBuf>,
    /// Project-relative directory of root pages; unknown page sources under
    /// it are registered as new roots.
    pub pages_dir: String,
}

/// Stateful orchestrator for one dev session.
pub struct DevSession {
    registry: RwLock<ComponentRegistry>,
    source_map: RwLock<SourceMap>,
    changes: Mutex<ChangeLog>,
    recent: RecentBuilds,
    packer: Arc<dyn Packer>,
    parser: Arc<dyn SourceParser>,
    dep_out: Option<PathBuf>,
    pages_dir: String,
    logger: Logger,
}

/// Classification made under the change-log lock.
enum Plan {
    Direct(Arc<Component>),
    Indirect(Vec<Arc<Component>>),
    NewPage,
}

impl DevSession {
    pub fn new(
        registry: ComponentRegistry,
        source_map: SourceMap,
        packer: Arc<dyn Packer>,
        parser: Arc<dyn SourceParser>,
        settings: SessionSettings,
        logger: Logger,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            source_map: RwLock::new(source_map),
            changes: Mutex::new(ChangeLog::new(settings.change_retention)),
            recent: RecentBuilds::new(settings.recent_build_ttl),
            packer,
            parser,
            dep_out: settings.dep_out,
            pages_dir: normalize_source_path(&settings.pages_dir),
            logger,
        }
    }

    /// Pack every page and index the dependency graph.
    pub fn bootstrap(
        packer: Arc<dyn Packer>,
        parser: Arc<dyn SourceParser>,
        pages: &[String],
        settings: SessionSettings,
        logger: Logger,
    ) -> Result<Self, BootstrapError> {
        let components = packer.pack_many(pages)?;
        let registry = ComponentRegistry::new(components);

        let query = ParserQuery::new(parser.clone(), registry.root_dependencies());
        let source_map = SourceMap::build(&query, "")?;
        for (importer, imported) in source_map.tree().cycles() {
            debug!(logger, "graph"; "import cycle: {importer} -> {imported}");
        }

        log!(logger, "dev"; "packed {} pages, tracking {} dependencies", registry.len(), source_map.len());
        let session = Self::new(registry, source_map, packer, parser, settings, logger);
        session.write_dependency_graph();
        Ok(session)
    }

    /// Registered components in path order.
    pub fn components(&self) -> ComponentList {
        self.registry.read().components()
    }

    /// Source path of the component behind `bundle_key`.
    pub fn path_of_bundle(&self, bundle_key: &str) -> Option<String> {
        self.registry
            .read()
            .find_by_key(bundle_key)
            .map(|c| c.original_path().to_string())
    }

    pub fn recent(&self) -> &RecentBuilds {
        &self.recent
    }

    /// Roots whose build includes `path`.
    pub fn find_roots(&self, path: &str) -> Vec<String> {
        self.source_map.read().find_roots(path)
    }

    /// Process a file change.
    ///
    /// `Err(TooRecentlyProcessed)` means the event was dropped by the
    /// debounce window; every other error is a failed rebuild.
    pub fn do_change_request(
        &self,
        path: &str,
        opts: &ChangeRequestOpts,
    ) -> Result<ChangeOutcome, ChangeError> {
        let path = normalize_source_path(path);
        let now = Instant::now();

        let plan = {
            let mut changes = self.changes.lock();
            if changes.is_recent(&path, now, opts.debounce) {
                return Err(ChangeError::TooRecentlyProcessed(path));
            }

            let registry = self.registry.read();
            let plan = match registry.get(&path) {
                Some(component) => Plan::Direct(component.clone()),
                None => {
                    let roots = self.source_map.read().find_roots(&path);
                    if !roots.is_empty() {
                        Plan::Indirect(registry.find_many(&roots))
                    } else if self.is_new_page(&path) {
                        Plan::NewPage
                    } else {
                        debug!(self.logger, "dev"; "ignored {path}");
                        return Ok(ChangeOutcome::Ignored);
                    }
                }
            };
            drop(registry);

            changes.record(&path, now);
            plan
        };

        let result = match plan {
            Plan::Direct(component) => self
                .direct_change(&path, &component, opts)
                .map_err(ChangeError::from),
            Plan::Indirect(components) => self
                .indirect_change(&path, &components, opts)
                .map_err(ChangeError::from),
            Plan::NewPage => self.new_page(&path),
        };

        match result {
            Ok(outcome) => {
                self.write_dependency_graph();
                Ok(outcome)
            }
            Err(e) => {
                self.changes.lock().forget(&path, now);
                Err(e)
            }
        }
    }

    /// Rebuild the component behind `bundle_key` unless it was built recently,
    /// then signal a reload for it.
    pub fn do_bundle_key_change_request(
        &self,
        bundle_key: &str,
        opts: &ChangeRequestOpts,
    ) -> Result<ChangeOutcome, ChangeError> {
        let component = self
            .registry
            .read()
            .find_by_key(bundle_key)
            .cloned()
            .ok_or_else(|| ChangeError::UnknownBundle(bundle_key.to_string()))?;

        if self.recent.is_fresh(bundle_key) {
            return Ok(ChangeOutcome::Fresh);
        }

        with_hook(opts.hook.as_ref(), component.original_path(), || component.repack())?;
        self.recent.mark(bundle_key);
        opts.hot_reload.reload_signal(bundle_key);

        Ok(ChangeOutcome::OnDemand {
            bundle_key: bundle_key.to_string(),
        })
    }

    fn direct_change(
        &self,
        path: &str,
        component: &Component,
        opts: &ChangeRequestOpts,
    ) -> Result<ChangeOutcome, PackError> {
        with_hook(opts.hook.as_ref(), path, || component.repack())?;

        let key = component.bundle_key();
        self.recent.mark(key);
        self.patch_source_map(path, Some(component.local_dependencies()));
        opts.hot_reload.reload_signal(key);

        Ok(ChangeOutcome::Direct {
            bundle_key: key.to_string(),
        })
    }

    fn indirect_change(
        &self,
        path: &str,
        components: &[Arc<Component>],
        opts: &ChangeRequestOpts,
    ) -> Result<ChangeOutcome, PackError> {
        let (visible, deferred): (Vec<_>, Vec<_>) = components
            .iter()
            .cloned()
            .partition(|c| opts.hot_reload.is_active_bundle(c.bundle_key()));

        let outcome = if visible.is_empty() {
            repack_many(components, opts.hook.as_ref())?;
            for component in components {
                self.recent.mark(component.bundle_key());
            }
            ChangeOutcome::Indirect {
                rebuilt: paths_of(components),
                reloaded: Vec::new(),
            }
        } else {
            // Off-screen dependents rebuild when the client navigates to them.
            for component in &deferred {
                self.recent.invalidate(component.bundle_key());
            }

            repack_many(&visible, opts.hook.as_ref())?;
            let mut reloaded = Vec::with_capacity(visible.len());
            for component in &visible {
                let key = component.bundle_key();
                self.recent.mark(key);
                opts.hot_reload.reload_signal(key);
                reloaded.push(key.to_string());
            }
            ChangeOutcome::Indirect {
                rebuilt: paths_of(&visible),
                reloaded,
            }
        };

        self.patch_source_map(path, None);
        Ok(outcome)
    }

    /// Pack a page created after bootstrap and add it to the registry and
    /// the dependency index.
    fn new_page(&self, path: &str) -> Result<ChangeOutcome, ChangeError> {
        let component = self.packer.pack_single(path)?;
        let query = ParserQuery::new(
            self.parser.clone(),
            [(path.to_string(), component.local_dependencies())],
        );
        let page_map = SourceMap::build(&query, "")?;

        let key = component.bundle_key().to_string();
        {
            let mut registry = self.registry.write();
            if let Some(existing) = registry.find_by_name(component.name()) {
                return Err(ChangeError::DuplicatePage {
                    path: path.to_string(),
                    name: component.name().to_string(),
                    existing: existing.original_path().to_string(),
                });
            }
            registry.insert(component);
        }
        self.source_map.write().merge(page_map);
        self.recent.mark(&key);
        log!(self.logger, "dev"; "registered new page {path}");

        Ok(ChangeOutcome::NewPage { bundle_key: key })
    }

    fn is_new_page(&self, path: &str) -> bool {
        let under_pages = self.pages_dir.is_empty()
            || path
                .strip_prefix(self.pages_dir.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
        under_pages && is_page_source(path)
    }

    /// Replace the edges of `path`, re-querying them when not given.
    ///
    /// Failures leave the previous edges and are only logged.
    fn patch_source_map(&self, path: &str, dependencies: Option<Vec<String>>) {
        let query = ParserQuery::uncached(self.parser.clone(), Vec::new());
        let mut source_map = self.source_map.write();
        let result = match dependencies {
            Some(deps) => source_map.update_dependencies(&query, path, deps),
            None => source_map.refresh(&query, path),
        };

        if let Err(e) = result {
            log!(self.logger, "graph"; "kept previous edges of {path}: {e}");
        }
    }

    fn write_dependency_graph(&self) {
        let Some(out) = &self.dep_out else {
            return;
        };
        if let Err(e) = self.source_map.read().write(out) {
            log!(self.logger, "graph"; "{e}");
        }
    }
}

fn paths_of(components: &[Arc<Component>]) -> Vec<String> {
    components
        .iter()
        .map(|c| c.original_path().to_string())
        .collect()
}
