//! `pagepack dev`: bootstrap a session and watch.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::common::{discover_pages, keys_file, pack_pipeline, packer};
use crate::actor::Coordinator;
use crate::config::PackConfig;
use crate::core::CancelToken;
use crate::log;
use crate::logger::Logger;
use crate::session::{DevSession, SessionSettings};

/// Pack every page, then run the watch actors until `cancel` trips.
///
/// A failed bootstrap is fatal: no partial registry or graph is served.
pub fn run_dev(config: Arc<PackConfig>, cancel: CancelToken, logger: &Logger) -> Result<()> {
    let pages = discover_pages(&config)?;
    let (parser, pipeline) = pack_pipeline(&config, cancel.clone(), logger);
    let packer = Arc::new(packer(&config, pipeline, logger));

    let settings = SessionSettings {
        change_retention: config.dev.change_retention(),
        recent_build_ttl: config.dev.recent_build_ttl(),
        dep_out: config.dep_out(),
        pages_dir: config.build.pages_dir.to_string_lossy().into_owned(),
    };
    let session = DevSession::bootstrap(packer, parser, &pages, settings, logger.clone())
        .context("failed to start dev session")?;

    let keys = keys_file(&config);
    if let Err(e) = session.components().write_keys(&keys) {
        log!(logger, "dev"; "failed to write `{}`: {e}", keys.display());
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    log!(logger, "dev"; "watching {}", config.build.web_dir.display());
    rt.block_on(Coordinator::new(config, Arc::new(session), cancel, logger.clone()).run())
}
