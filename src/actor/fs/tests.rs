use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::filter::WatchFilter;
use super::pending::PendingChanges;
use super::report;
use crate::config::PackConfig;
use crate::logger::Logger;
use crate::pack::{NoopHook, PackError};
use crate::reload::{HotReloader, LogLevel};
use crate::session::{ChangeError, ChangeOutcome, ChangeRequestOpts};

fn make_filter() -> WatchFilter {
    WatchFilter::new(
        PathBuf::from("/site"),
        &[".orbit/".to_string(), "node_modules/".to_string(), "./dist".to_string()],
    )
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

#[test]
fn test_filter_drops_configured_output_dirs() {
    let mut config = PackConfig::default();
    config.build.web_dir = PathBuf::from("/site");
    config.build.out_dir = PathBuf::from("./dist");
    config.build.node_modules = PathBuf::from("/site/vendor/node_modules");
    config.dev.ignore = Vec::new();
    let filter = WatchFilter::for_project(PathBuf::from("/site"), &config);

    for generated in [
        "/site/dist/abc.entry.jsx",
        "/site/dist/abc.config.js",
        "/site/dist/dist/abc.js",
        "/site/vendor/node_modules/react/index.js",
    ] {
        assert_eq!(filter.accept(&PathBuf::from(generated)), None, "{generated}");
    }
    assert_eq!(
        filter.accept(&PathBuf::from("/site/distribution/home.jsx")).as_deref(),
        Some("distribution/home.jsx")
    );
    assert_eq!(
        filter.accept(&PathBuf::from("/site/pages/dist.jsx")).as_deref(),
        Some("pages/dist.jsx")
    );
}

#[test]
fn test_filter_relativizes_paths() {
    let filter = make_filter();
    assert_eq!(
        filter.accept(&PathBuf::from("/site/pages/home.jsx")).as_deref(),
        Some("pages/home.jsx")
    );
    assert_eq!(filter.accept(&PathBuf::from("/elsewhere/home.jsx")), None);
    assert_eq!(filter.accept(&PathBuf::from("/site")), None);
}

#[test]
fn test_filter_ignores_fragments() {
    let filter = make_filter();
    assert_eq!(filter.accept(&PathBuf::from("/site/.orbit/abc.entry.jsx")), None);
    assert_eq!(
        filter.accept(&PathBuf::from("/site/web/node_modules/react/index.js")),
        None
    );
    assert_eq!(filter.accept(&PathBuf::from("/site/dist/app.js")), None);
    assert!(filter.accept(&PathBuf::from("/site/components/orbit.jsx")).is_some());
}

#[test]
fn test_filter_skips_editor_artifacts() {
    let filter = make_filter();
    for path in [
        "/site/pages/home.jsx~",
        "/site/pages/.home.jsx.swp",
        "/site/pages/home.jsx.bak",
        "/site/pages/home.tmp",
    ] {
        assert_eq!(filter.accept(&PathBuf::from(path)), None, "{path}");
    }
}

#[test]
fn test_pending_keeps_created_and_modified() {
    let filter = make_filter();
    let mut pending = PendingChanges::default();

    pending.add_event(&make_event(vec!["/site/pages/a.jsx"], create_kind()), &filter);
    pending.add_event(&make_event(vec!["/site/pages/b.jsx"], modify_kind()), &filter);
    pending.add_event(&make_event(vec!["/site/pages/c.jsx"], remove_kind()), &filter);
    pending.add_event(&make_event(vec!["/site/pages/d.jsx"], metadata_kind()), &filter);

    assert_eq!(pending.take(), vec!["pages/a.jsx", "pages/b.jsx"]);
    assert!(pending.is_empty());
}

#[test]
fn test_pending_coalesces_bursts() {
    let filter = make_filter();
    let mut pending = PendingChanges::default();

    for _ in 0..5 {
        pending.add_event(
            &make_event(vec!["/site/pages/a.jsx", "/site/components/b.jsx"], modify_kind()),
            &filter,
        );
    }
    pending.add_event(&make_event(vec!["/site/pages/a.jsx"], create_kind()), &filter);

    assert_eq!(pending.take(), vec!["pages/a.jsx", "components/b.jsx"]);

    // A taken path can be queued again on the next tick
    pending.add_event(&make_event(vec!["/site/pages/a.jsx"], modify_kind()), &filter);
    assert_eq!(pending.take(), vec!["pages/a.jsx"]);
}

#[derive(Default)]
struct EmitRecorder {
    emitted: Mutex<Vec<(LogLevel, String)>>,
}

impl HotReloader for EmitRecorder {
    fn reload_signal(&self, _bundle_key: &str) {}

    fn emit(&self, level: LogLevel, message: &str) {
        self.emitted.lock().push((level, message.to_string()));
    }

    fn is_active(&self) -> bool {
        true
    }

    fn is_active_bundle(&self, _bundle_key: &str) -> bool {
        false
    }

    fn current_bundle_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

fn make_opts() -> (Arc<EmitRecorder>, ChangeRequestOpts) {
    let recorder = Arc::new(EmitRecorder::default());
    let opts = ChangeRequestOpts {
        debounce: Duration::from_secs(1),
        hot_reload: recorder.clone(),
        hook: Arc::new(NoopHook),
    };
    (recorder, opts)
}

#[test]
fn test_report_failure_reaches_client_as_error() {
    let (recorder, opts) = make_opts();
    let logger = Logger::capture();

    let err = ChangeError::Pack(PackError::Cancelled("pages/home.jsx".into()));
    report("pages/home.jsx", Err(err), &opts, &logger);

    let emitted = recorder.emitted.lock();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].0, LogLevel::Error);
    assert_eq!(emitted[0].1, "packing `pages/home.jsx` was cancelled");
    assert!(logger.lines()[0].starts_with("[status] failed pages/home.jsx"));
}

#[test]
fn test_report_debounce_is_not_a_failure() {
    let (recorder, opts) = make_opts();
    let logger = Logger::capture();

    let err = ChangeError::TooRecentlyProcessed("pages/home.jsx".into());
    report("pages/home.jsx", Err(err), &opts, &logger);

    assert!(recorder.emitted.lock().is_empty());
    assert!(logger.lines().iter().all(|l| l.starts_with("[watch]")));
}

#[test]
fn test_report_success_updates_status() {
    let (recorder, opts) = make_opts();
    let logger = Logger::capture();

    let outcome = ChangeOutcome::Indirect {
        rebuilt: vec!["pages/about.jsx".into(), "pages/home.jsx".into()],
        reloaded: Vec::new(),
    };
    report("components/button.jsx", Ok(outcome), &opts, &logger);
    report("README.md", Ok(ChangeOutcome::Ignored), &opts, &logger);

    assert!(recorder.emitted.lock().is_empty());
    assert_eq!(
        logger.lines(),
        vec!["[status] rebuilt pages/about.jsx, pages/home.jsx (components/button.jsx)"]
    );
}

#[test]
fn test_report_new_page_updates_status() {
    let (_recorder, opts) = make_opts();
    let logger = Logger::capture();

    let outcome = ChangeOutcome::NewPage {
        bundle_key: "abc".into(),
    };
    report("pages/blog.jsx", Ok(outcome), &opts, &logger);

    assert_eq!(logger.lines(), vec!["[status] registered pages/blog.jsx"]);
}
