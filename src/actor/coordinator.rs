//! Actor Coordinator - wires up the watch mode tasks.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::fs::FsActor;
use super::redirect::RedirectActor;
use crate::config::PackConfig;
use crate::core::CancelToken;
use crate::logger::Logger;
use crate::pack::TimingHook;
use crate::reload::{HotReload, start_ws_server};
use crate::session::{ChangeRequestOpts, DevSession};
use crate::{debug, log};

/// Runs the hot reload server, the watch loop and the redirection bundler
/// around one bootstrapped session.
pub struct Coordinator {
    config: Arc<PackConfig>,
    session: Arc<DevSession>,
    cancel: CancelToken,
    logger: Logger,
}

impl Coordinator {
    pub fn new(
        config: Arc<PackConfig>,
        session: Arc<DevSession>,
        cancel: CancelToken,
        logger: Logger,
    ) -> Self {
        Self {
            config,
            session,
            cancel,
            logger,
        }
    }

    /// Run until cancelled or until one of the tasks stops.
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            session,
            cancel,
            logger,
        } = self;

        let (hot_reload, redirects) = HotReload::new(logger.clone());
        let hot_reload = Arc::new(hot_reload);
        let port = start_ws_server(config.dev.port, hot_reload.clone(), cancel.clone(), logger.clone())?;
        log!(logger, "reload"; "listening on ws://127.0.0.1:{port}");

        let opts = ChangeRequestOpts {
            debounce: config.dev.debounce(),
            hot_reload,
            hook: Arc::new(TimingHook::new(logger.clone())),
        };

        let fs = FsActor::new(
            &config.build.web_dir,
            &config,
            session.clone(),
            opts.clone(),
            cancel.clone(),
            logger.clone(),
        )
        .context("failed to start file watcher")?;
        let redirect = RedirectActor::new(redirects, session, opts, cancel.clone(), logger.clone());

        debug!(logger, "actor"; "start");
        let fs_handle = tokio::spawn(fs.run());
        let redirect_handle = tokio::spawn(redirect.run());

        tokio::select! {
            _ = cancel.cancelled() => debug!(logger, "actor"; "shutdown signal received"),
            _ = fs_handle => {}
            _ = redirect_handle => {}
        }

        // Stop whichever task is still running, plus the reload threads.
        cancel.cancel();
        debug!(logger, "actor"; "stopped");
        Ok(())
    }
}
