//! Configuration section definitions.
//!
//! | Module  | TOML Section | Purpose                              |
//! |---------|--------------|--------------------------------------|
//! | `build` | `[build]`    | Source, output and bundler settings  |
//! | `dev`   | `[dev]`      | Watch timing, hot reload port        |

mod build;
mod dev;

pub use build::BuildConfig;
pub use dev::DevConfig;
