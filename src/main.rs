//! yoke - local preview server with live reload for static web apps.

#![allow(dead_code)]

mod api;
mod cli;
mod config;
mod core;
mod embed;
mod error;
mod logger;
mod preprocess;
mod reload;
mod render;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ProgramConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = ProgramConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::run(config),
        Commands::Render { args } => cli::render::run(config, args),
    }
}
