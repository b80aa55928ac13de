//! FileSystem Actor
//!
//! Watches the web directory and hands changed paths to the dev session.
//!
//! ```text
//! notify thread → PendingChanges (filtered, deduped) → tick → DevSession
//! ```
//!
//! Events arriving between two ticks are coalesced; each tick dispatches
//! every pending path as its own blocking change request.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::PackConfig;
use crate::core::CancelToken;
use crate::logger::Logger;
use crate::reload::LogLevel;
use crate::session::{ChangeError, ChangeOutcome, ChangeRequestOpts, DevSession};
use crate::{debug, log};

// Path filtering (ignore fragments, editor artifacts).
mod filter;
// Per-tick coalescing.
mod pending;

#[cfg(test)]
mod tests;

use filter::WatchFilter;
use pending::PendingChanges;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    filter: WatchFilter,
    interval: Duration,
    session: Arc<DevSession>,
    opts: ChangeRequestOpts,
    cancel: CancelToken,
    logger: Logger,
}

impl FsActor {
    /// Start watching `root` recursively.
    ///
    /// Paths under the configured output and `node_modules` directories are
    /// always dropped, on top of `dev.ignore`.
    ///
    /// Events buffer in the channel until [`FsActor::run`] is awaited.
    #[rustfmt::skip]
    pub fn new(
        root: &Path,
        config: &PackConfig,
        session: Arc<DevSession>,
        opts: ChangeRequestOpts,
        cancel: CancelToken,
        logger: Logger,
    ) -> notify::Result<Self> {
        // notify is sync; bridge it through a std channel
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Watch the canonical root so event paths share its prefix
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        watcher.watch(&root, RecursiveMode::Recursive)?;
        debug!(logger, "watch"; "watching {}", root.display());

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            filter: WatchFilter::for_project(root, config),
            interval: config.dev.watch_interval(),
            session,
            opts,
            cancel,
            logger,
        })
    }

    /// Run the actor event loop until cancelled.
    pub async fn run(self) {
        let Self {
            notify_rx,
            _watcher,
            filter,
            interval,
            session,
            opts,
            cancel,
            logger,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Result<notify::Event>>(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                if async_tx.blocking_send(result).is_err() {
                    break; // Receiver dropped
                }
            }
        });

        let mut pending = PendingChanges::default();
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = async_rx.recv() => match received {
                    Some(Ok(event)) => {
                        debug!(logger, "watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
                        pending.add_event(&event, &filter);
                    }
                    Some(Err(e)) => log!(logger, "watch"; "notify error: {e}"),
                    None => break,
                },
                _ = tick.tick() => {
                    if !pending.is_empty() {
                        dispatch(pending.take(), &session, &opts, &logger).await;
                    }
                }
            }
        }

        debug!(logger, "watch"; "stopped watching {}", filter.root().display());
    }
}

/// Run one change request per path concurrently and report each result.
async fn dispatch(
    paths: Vec<String>,
    session: &Arc<DevSession>,
    opts: &ChangeRequestOpts,
    logger: &Logger,
) {
    let tasks: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let session = Arc::clone(session);
            let opts = opts.clone();
            tokio::task::spawn_blocking(move || {
                let result = session.do_change_request(&path, &opts);
                (path, result)
            })
        })
        .collect();

    for task in tasks {
        match task.await {
            Ok((path, result)) => report(&path, result, opts, logger),
            Err(e) => log!(logger, "watch"; "change request panicked: {e}"),
        }
    }
}

fn report(
    path: &str,
    result: Result<ChangeOutcome, ChangeError>,
    opts: &ChangeRequestOpts,
    logger: &Logger,
) {
    match result {
        Ok(ChangeOutcome::Direct { .. }) => logger.status_success(&format!("rebuilt {path}")),
        Ok(ChangeOutcome::Indirect { rebuilt, .. }) => {
            logger.status_success(&format!("rebuilt {} ({path})", rebuilt.join(", ")));
        }
        Ok(ChangeOutcome::NewPage { .. }) => logger.status_success(&format!("registered {path}")),
        Ok(_) => {}
        Err(e) if e.is_debounce() => debug!(logger, "watch"; "{e}"),
        Err(e) => {
            let detail = e.detail();
            logger.status_error(&format!("failed {path}"), &detail);
            opts.hot_reload.emit(LogLevel::Error, &detail);
        }
    }
}
