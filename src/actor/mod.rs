//! Actor System for Watch Mode
//!
//! Tokio tasks around one [`DevSession`](crate::session::DevSession):
//!
//! ```text
//! FsActor ───────> DevSession <─────── RedirectActor
//! (notify)          (repack)         (client navigation)
//!                      │
//!                      └──> HotReload ──> browser
//! ```
//!
//! # Module Structure
//!
//! - `fs` - File system watcher with per-tick coalescing
//! - `redirect` - Rebuilds bundles the client navigates to
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod redirect;

pub use coordinator::Coordinator;
