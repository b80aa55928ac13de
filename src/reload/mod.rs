//! Hot reload over a WebSocket.
//!
//! One browser connection at a time reports which page bundles it displays;
//! the dev session pushes reload signals for rebuilt bundles that are on
//! screen and `warn`/`error` messages for build problems.
//!
//! ```text
//! browser --pages--> HotReload --RedirectionEvent--> redirect actor --> DevSession
//! DevSession --reload_signal--> HotReload --reload--> browser
//! ```
//!
//! - `message` - wire format
//! - `diff` - newly shown bundle keys on navigation
//! - `session` - the connection and its displayed keys
//! - `server` - listener and reader threads

pub mod diff;
pub mod message;
pub mod server;
pub mod session;

pub use diff::RedirectionEvent;
pub use message::{ClientMessage, LogLevel, ServerMessage};
pub use server::start_ws_server;
pub use session::{HotReload, HotReloader, Socket, SocketError};
