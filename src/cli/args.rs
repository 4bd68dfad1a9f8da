//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::render::PageRole;

/// yoke local preview CLI
#[derive(Parser, Debug, Clone)]
#[command(name = "yoke", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: yoke.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "yoke.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the local preview server with live reload
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Render an entry page to stdout or a file
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },
}

/// Serve command arguments. Every option falls back to yoke.toml, then to
/// the built-in default.
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Build mode (debug or release)
    #[arg(short, long)]
    pub build: Option<String>,

    /// Enable the file watcher and live-reload notifier
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub livereload: Option<bool>,

    /// Port for the live-reload notifier
    #[arg(long)]
    pub livereload_port: Option<u16>,

    /// Serve / as a redirect to the simulator host, keeping entry pages
    /// uploaded there
    #[arg(short, long)]
    pub simulator: bool,

    /// Open a browser tab once the server is listening
    #[arg(short, long)]
    pub open: bool,

    /// Hosted-platform app identifier
    #[arg(long)]
    pub app_id: Option<String>,

    /// Platform API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Render command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Page to render (index or login)
    #[arg(long, default_value = "index")]
    pub page: PageRole,

    /// Build mode (debug or release)
    #[arg(short, long)]
    pub build: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Hosted-platform app identifier
    #[arg(long)]
    pub app_id: Option<String>,

    /// Platform API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
