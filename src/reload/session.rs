//! The hot reload session: one connection and the bundle keys it displays.
//!
//! Last connection wins. Attaching a new socket closes the previous one
//! before the swap, and resets the displayed keys until the new client
//! reports its pages.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::{ClientMessage, LogLevel, RedirectionEvent, ServerMessage};
use crate::logger::Logger;
use crate::{debug, log};

/// Socket failures.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),
}

/// Text-frame duplex connection.
pub trait Socket: Send {
    fn send_text(&mut self, text: &str) -> Result<(), SocketError>;

    /// Next text frame, or `None` when nothing is waiting.
    fn read_text(&mut self) -> Result<Option<String>, SocketError>;

    fn close(&mut self);
}

/// Flush attempts when the non-blocking stream is full.
const FLUSH_ATTEMPTS: usize = 20;
const FLUSH_RETRY_DELAY: Duration = Duration::from_millis(5);

fn is_would_block(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(e) if e.kind() == ErrorKind::WouldBlock)
}

/// Run `op` until it stops reporting `WouldBlock`, at most `attempts` times.
///
/// Still blocked after the last attempt is not an error: the frame stays
/// queued in the socket and goes out with the next write or read.
fn retry_would_block(
    attempts: usize,
    delay: Duration,
    mut op: impl FnMut() -> Result<(), tungstenite::Error>,
) -> Result<(), tungstenite::Error> {
    for _ in 0..attempts {
        match op() {
            Err(e) if is_would_block(&e) => std::thread::sleep(delay),
            other => return other,
        }
    }
    Ok(())
}

impl Socket for WebSocket<TcpStream> {
    fn send_text(&mut self, text: &str) -> Result<(), SocketError> {
        match self.send(Message::Text(text.to_string().into())) {
            // The frame is buffered; only the flush is pending.
            Err(e) if is_would_block(&e) => {
                retry_would_block(FLUSH_ATTEMPTS, FLUSH_RETRY_DELAY, || self.flush())?;
            }
            other => other?,
        }
        Ok(())
    }

    fn read_text(&mut self) -> Result<Option<String>, SocketError> {
        match self.read() {
            Ok(Message::Text(text)) => Ok(Some(text.as_str().to_string())),
            Ok(Message::Close(_)) => Err(SocketError::Closed),
            Ok(_) => Ok(None),
            Err(ref e) if is_would_block(e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        let _ = WebSocket::close(self, None);
        let _ = self.flush();
    }
}

/// What the orchestrator needs from the hot reload session.
///
/// Delivery failures are logged and swallowed.
pub trait HotReloader: Send + Sync {
    /// Tell the client to reload if it displays `bundle_key`.
    fn reload_signal(&self, bundle_key: &str);

    /// Surface a build problem to the client.
    fn emit(&self, level: LogLevel, message: &str);

    /// Whether a client is connected.
    fn is_active(&self) -> bool;

    /// Whether a connected client displays `bundle_key`.
    fn is_active_bundle(&self, bundle_key: &str) -> bool;

    fn current_bundle_keys(&self) -> Vec<String>;
}

#[derive(Default)]
struct SessionState {
    socket: Option<Box<dyn Socket>>,
    current: Vec<String>,
}

/// Single-connection hot reload session.
pub struct HotReload {
    state: Mutex<SessionState>,
    redirects: mpsc::UnboundedSender<RedirectionEvent>,
    logger: Logger,
}

impl HotReload {
    /// Create a session and the stream of navigation events it produces.
    pub fn new(logger: Logger) -> (Self, mpsc::UnboundedReceiver<RedirectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            state: Mutex::new(SessionState::default()),
            redirects: tx,
            logger,
        };
        (session, rx)
    }

    /// Replace the current connection.
    pub fn attach(&self, socket: Box<dyn Socket>) {
        let mut state = self.state.lock();
        if let Some(mut old) = state.socket.take() {
            old.close();
            debug!(self.logger, "reload"; "replaced previous client");
        }
        state.socket = Some(socket);
        state.current.clear();
    }

    /// Drop the current connection, if any.
    pub fn detach(&self) {
        let mut state = self.state.lock();
        if let Some(mut socket) = state.socket.take() {
            socket.close();
        }
        state.current.clear();
    }

    /// Read and handle every waiting frame. Returns `false` once the
    /// connection is gone.
    pub fn poll(&self) -> bool {
        let mut state = self.state.lock();
        loop {
            let Some(socket) = state.socket.as_mut() else {
                return false;
            };

            match socket.read_text() {
                Ok(Some(text)) => self.handle_frame(&mut state, &text),
                Ok(None) => return true,
                Err(e) => {
                    debug!(self.logger, "reload"; "client disconnected: {e}");
                    state.socket = None;
                    state.current.clear();
                    return false;
                }
            }
        }
    }

    fn handle_frame(&self, state: &mut SessionState, text: &str) {
        let Some(ClientMessage::Pages { value }) = ClientMessage::parse(text) else {
            debug!(self.logger, "reload"; "ignored frame: {text}");
            return;
        };

        let previous = std::mem::replace(&mut state.current, value.clone());
        let event = RedirectionEvent::new(previous, value);
        if self.redirects.send(event).is_err() {
            debug!(self.logger, "reload"; "no redirection listener");
        }
    }

    fn send(&self, state: &mut SessionState, message: &ServerMessage) {
        let Some(socket) = state.socket.as_mut() else {
            return;
        };

        if let Err(e) = socket.send_text(&message.to_json()) {
            log!(self.logger, "reload"; "failed to send to client: {e}");
            state.socket = None;
            state.current.clear();
        }
    }
}

impl HotReloader for HotReload {
    fn reload_signal(&self, bundle_key: &str) {
        let mut state = self.state.lock();
        if !state.current.iter().any(|k| k == bundle_key) {
            return;
        }
        self.send(&mut state, &ServerMessage::Reload);
    }

    fn emit(&self, level: LogLevel, message: &str) {
        let mut state = self.state.lock();
        self.send(&mut state, &ServerMessage::log(level, message));
    }

    fn is_active(&self) -> bool {
        self.state.lock().socket.is_some()
    }

    fn is_active_bundle(&self, bundle_key: &str) -> bool {
        let state = self.state.lock();
        state.socket.is_some() && state.current.iter().any(|k| k == bundle_key)
    }

    fn current_bundle_keys(&self) -> Vec<String> {
        self.state.lock().current.clone()
    }
}
