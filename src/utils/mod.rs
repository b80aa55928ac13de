//! Shared helpers with no session state.
//!
//! - [`exec`]: external command runner used by the bundler
//! - [`hash`]: content-derived bundle keys
//! - [`path`]: slash-based source path normalization

pub mod exec;
pub mod hash;
pub mod path;
