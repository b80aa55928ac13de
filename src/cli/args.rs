//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::bundler::BundlerMode;

/// Pagepack: component packer with hot reload for JSX pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pagepack.toml)
    #[arg(short = 'C', long, global = true, default_value = "pagepack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Pack every page, then rebuild on change with hot reload
    #[command(visible_alias = "d")]
    Dev {
        /// Hot reload websocket port
        #[arg(short, long)]
        port: Option<u16>,

        /// Bundler mode (development, production)
        #[arg(short, long)]
        mode: Option<BundlerMode>,
    },

    /// Pack every page once and write the component audit
    #[command(visible_alias = "b")]
    Build {
        /// Bundler mode (development, production)
        #[arg(short, long)]
        mode: Option<BundlerMode>,
    },

    /// Write the dependency graph of every page
    #[command(visible_alias = "g")]
    Graph {
        /// Output file (default: <out_dir>/dependency.graph)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}
