//! Redirection bundler.
//!
//! When the client navigates, bundles that just came on screen are rebuilt
//! unless they were built recently. Bundles whose rebuild was deferred by the
//! indirect-priority path land here.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::CancelToken;
use crate::logger::Logger;
use crate::reload::{LogLevel, RedirectionEvent};
use crate::session::{ChangeOutcome, ChangeRequestOpts, DevSession};
use crate::{debug, log};

pub struct RedirectActor {
    rx: mpsc::UnboundedReceiver<RedirectionEvent>,
    session: Arc<DevSession>,
    opts: ChangeRequestOpts,
    cancel: CancelToken,
    logger: Logger,
}

impl RedirectActor {
    pub fn new(
        rx: mpsc::UnboundedReceiver<RedirectionEvent>,
        session: Arc<DevSession>,
        opts: ChangeRequestOpts,
        cancel: CancelToken,
        logger: Logger,
    ) -> Self {
        Self {
            rx,
            session,
            opts,
            cancel,
            logger,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = self.rx.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }
    }

    async fn handle(&self, event: RedirectionEvent) {
        for key in event.newly_shown() {
            if self.session.recent().is_fresh(&key) {
                debug!(self.logger, "reload"; "{key} is fresh");
                continue;
            }

            let session = Arc::clone(&self.session);
            let opts = self.opts.clone();
            let task = tokio::task::spawn_blocking(move || {
                let result = session.do_bundle_key_change_request(&key, &opts);
                (key, result)
            });

            match task.await {
                Ok((_, Ok(ChangeOutcome::OnDemand { bundle_key }))) => {
                    let path = self.session.path_of_bundle(&bundle_key).unwrap_or(bundle_key);
                    self.logger.status_success(&format!("rebuilt {path}"));
                }
                Ok((_, Ok(_))) => {}
                Ok((key, Err(e))) => {
                    let detail = e.detail();
                    self.logger
                        .status_warning(&format!("on-demand rebuild of {key} failed: {detail}"));
                    self.opts.hot_reload.emit(LogLevel::Warn, &detail);
                }
                Err(e) => log!(self.logger, "reload"; "rebuild task panicked: {e}"),
            }
        }
    }
}
