//! In-memory parser and recording bundler for tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tempfile::TempDir;

use super::PackPipeline;
use crate::bundler::{BundleError, BundleRequest, BundleResource, Bundler, ReactCsrWrapper};
use crate::core::CancelToken;
use crate::parse::{ImportDependency, PageDocument, ParseError, SourceParser};
use crate::utils::exec::ExecError;

/// Parser serving pages registered with [`MemoryParser::set_page`].
#[derive(Default)]
pub struct MemoryParser {
    pages: Mutex<FxHashMap<String, (String, Vec<String>)>>,
    failing: Mutex<FxHashSet<String>>,
}

impl MemoryParser {
    pub fn set_page(&self, path: &str, name: &str, deps: &[&str]) {
        self.failing.lock().remove(path);
        self.pages.lock().insert(
            path.to_string(),
            (name.to_string(), deps.iter().map(|s| s.to_string()).collect()),
        );
    }

    /// Make every later parse of `path` fail.
    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }
}

impl SourceParser for MemoryParser {
    fn parse(&self, path: &str) -> Result<PageDocument, ParseError> {
        if self.failing.lock().contains(path) {
            return Err(ParseError::InvalidComponent {
                path: path.to_string(),
                reason: "syntax error".into(),
            });
        }

        let pages = self.pages.lock();
        let (name, deps) = pages.get(path).ok_or_else(|| ParseError::Io {
            path: PathBuf::from(path),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;

        let imports = std::iter::once(ImportDependency::external("react"))
            .chain(deps.iter().map(ImportDependency::local))
            .collect();
        Ok(PageDocument::new(name.clone(), imports, ""))
    }
}

/// Bundler that writes nothing and records each bundled key.
pub struct RecordingBundler {
    out_dir: PathBuf,
    delay: Duration,
    bundled: Mutex<Vec<(String, Instant)>>,
    failing: Mutex<FxHashSet<String>>,
}

impl RecordingBundler {
    pub fn bundled_keys(&self) -> Vec<String> {
        self.bundled.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Completion instants of every bundle of `key`.
    pub fn completions(&self, key: &str) -> Vec<Instant> {
        self.bundled
            .lock()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn fail(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }
}

impl Bundler for RecordingBundler {
    fn setup(&self, request: &BundleRequest) -> Result<BundleResource, BundleError> {
        Ok(BundleResource {
            entry_path: self.out_dir.join(format!("{}.entry.jsx", request.bundle_key)),
            config_path: self.out_dir.join(format!("{}.config.js", request.bundle_key)),
            config_source: request.bundle_key.clone(),
        })
    }

    fn bundle(&self, resource: &BundleResource) -> Result<(), BundleError> {
        std::thread::sleep(self.delay);
        let key = resource.config_source.clone();

        if self.failing.lock().contains(&key) {
            return Err(BundleError::Process {
                config: resource.config_path.clone(),
                source: ExecError::Failed {
                    program: "node".into(),
                    status: "exit status: 1".into(),
                    stderr: "SyntaxError".into(),
                },
            });
        }

        self.bundled.lock().push((key, Instant::now()));
        Ok(())
    }
}

/// Pipeline over a temp dir with in-memory collaborators.
pub struct Fixture {
    pub temp: TempDir,
    pub parser: Arc<MemoryParser>,
    pub bundler: Arc<RecordingBundler>,
    pub cancel: CancelToken,
    pub pipeline: Arc<PackPipeline>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_bundle_delay(Duration::ZERO)
    }

    pub fn with_bundle_delay(delay: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        let parser = Arc::new(MemoryParser::default());
        let bundler = Arc::new(RecordingBundler {
            out_dir: temp.path().join(".orbit"),
            delay,
            bundled: Mutex::default(),
            failing: Mutex::default(),
        });
        let cancel = CancelToken::new();
        let pipeline = Arc::new(PackPipeline::new(
            temp.path(),
            parser.clone(),
            Arc::new(ReactCsrWrapper),
            bundler.clone(),
            cancel.clone(),
        ));

        Self {
            temp,
            parser,
            bundler,
            cancel,
            pipeline,
        }
    }
}
