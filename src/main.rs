//! Pagepack - incremental JSX page packer with hot reload.

#![allow(dead_code)]

mod actor;
mod bundler;
mod cli;
mod config;
mod core;
mod graph;
mod logger;
mod pack;
mod parse;
mod reload;
mod session;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PackConfig;
use logger::Logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let logger = Logger::new(cli.verbose);
    let mut config = PackConfig::load(&cli.config, &logger)?;

    // Ctrl+C cancels in-flight packs and stops the actors
    let cancel = core::CancelToken::new();
    core::setup_shutdown_handler(cancel.clone())?;

    match cli.command {
        Commands::Dev { port, mode } => {
            if let Some(port) = port {
                config.dev.port = port;
            }
            if let Some(mode) = mode {
                config.build.mode = mode;
            }
            cli::dev::run_dev(Arc::new(config), cancel, &logger)
        }
        Commands::Build { mode } => {
            if let Some(mode) = mode {
                config.build.mode = mode;
            }
            cli::build::build_pages(&config, cancel, &logger)
        }
        Commands::Graph { out } => cli::graph::write_graph(&config, out.as_deref(), &logger).map(|_| ()),
    }
}
