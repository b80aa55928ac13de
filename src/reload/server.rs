//! WebSocket server for hot reload.
//!
//! Two plain threads: an acceptor that hands each handshaken connection to
//! [`HotReload::attach`], and a reader that polls the current connection.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use super::HotReload;
use crate::core::CancelToken;
use crate::logger::Logger;
use crate::{debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Accept loop back-off while no client is connecting.
const ACCEPT_INTERVAL: Duration = Duration::from_millis(100);

/// Reader poll interval.
const READ_INTERVAL: Duration = Duration::from_millis(50);

/// Start the hot reload server on `base_port` or the next free port.
///
/// Returns the bound port. Both threads exit once `cancel` trips.
pub fn start_ws_server(
    base_port: u16,
    session: Arc<HotReload>,
    cancel: CancelToken,
    logger: Logger,
) -> Result<u16> {
    let (listener, port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener
        .set_nonblocking(true)
        .context("failed to configure hot reload listener")?;

    {
        let session = session.clone();
        let cancel = cancel.clone();
        let logger = logger.clone();
        std::thread::Builder::new()
            .name("reload-accept".into())
            .spawn(move || accept_loop(&listener, &session, &cancel, &logger))
            .context("failed to spawn hot reload acceptor")?;
    }

    std::thread::Builder::new()
        .name("reload-read".into())
        .spawn(move || {
            while !cancel.is_cancelled() {
                std::thread::sleep(READ_INTERVAL);
                session.poll();
            }
            session.detach();
        })
        .context("failed to spawn hot reload reader")?;

    Ok(port)
}

fn accept_loop(listener: &TcpListener, session: &HotReload, cancel: &CancelToken, logger: &Logger) {
    while !cancel.is_cancelled() {
        match listener.accept() {
            Ok((stream, addr)) => {
                debug!(logger, "reload"; "client connected: {addr}");
                handshake(stream, session, logger);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_INTERVAL);
            }
            Err(e) => {
                log!(logger, "reload"; "accept error: {e}");
                std::thread::sleep(ACCEPT_INTERVAL);
            }
        }
    }
}

fn handshake(stream: TcpStream, session: &HotReload, logger: &Logger) {
    // Blocking during the handshake, non-blocking for polled reads after.
    let _ = stream.set_nonblocking(false);
    match tungstenite::accept(stream) {
        Ok(ws) => {
            let _ = ws.get_ref().set_nonblocking(true);
            session.attach(Box::new(ws));
        }
        Err(e) => log!(logger, "reload"; "handshake failed: {e}"),
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind hot reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::HotReloader;
    use std::time::Instant;
    use tungstenite::Message;

    #[test]
    fn bind_skips_ports_in_use() {
        let (first, port) = try_bind_port(0, 1).unwrap();
        let (_second, next) = try_bind_port(port, 3).unwrap();
        assert_ne!(port, next);
        drop(first);
    }

    #[test]
    fn client_round_trip() {
        let (session, mut rx) = HotReload::new(Logger::silent());
        let session = Arc::new(session);
        let cancel = CancelToken::new();
        let port = start_ws_server(0, session.clone(), cancel.clone(), Logger::silent()).unwrap();

        let (mut client, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        client
            .send(Message::Text(r#"{"operation":"pages","value":["abc"]}"#.to_string().into()))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !session.is_active_bundle("abc") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(session.is_active_bundle("abc"));
        assert_eq!(rx.try_recv().unwrap().newly_shown(), vec!["abc"]);

        session.reload_signal("abc");
        let frame = client.read().unwrap();
        assert_eq!(frame.into_text().unwrap().as_str(), r#"{"operation":"reload"}"#);

        cancel.cancel();
    }
}
