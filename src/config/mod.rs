//! Run configuration management for `yoke.toml`.
//!
//! # Sections
//!
//! | Section             | Purpose                                          |
//! |---------------------|--------------------------------------------------|
//! | `[app]`             | Hosted-platform identity (app id, name, API URL) |
//! | `[serve]`           | Local server (port, build mode, live reload)     |
//! | `[serve.base_dirs]` | Explicit per-mode base directory overrides       |
//!
//! Configuration is resolved once per invocation from built-in defaults,
//! the discovered `yoke.toml` and CLI overrides, in that order, and is
//! immutable after the server starts.

pub mod resolve;

pub use resolve::{BuildMode, ResolvedPages, resolve_pages};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};

/// Default port for the local preview server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default live-reload port. Intentionally off the standard livereload port
/// to avoid collisions if the app also uses a browser livereload plugin.
pub const DEFAULT_LIVERELOAD_PORT: u16 = 35728;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing yoke.toml plus CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Project root directory - parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file, when one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Hosted-platform identity
    pub app: AppSection,

    /// Local server settings
    pub serve: ServeSection,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            config_path: None,
            app: AppSection::default(),
            serve: ServeSection::default(),
        }
    }
}

/// `[app]` section: which hosted-platform app this project belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Hosted-platform app identifier
    pub app_id: Option<String>,

    /// Display name override (defaults to the platform's app name)
    pub name: Option<String>,

    /// Platform API base URL
    pub api_url: Option<String>,
}

/// `[serve]` section: local preview server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    /// HTTP port number.
    pub port: u16,

    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// Build mode: "debug" or "release". Validated at startup.
    pub build: String,

    /// Enable the file watcher and live-reload notifier.
    pub livereload: bool,

    /// Port for the live-reload notifier.
    pub livereload_port: u16,

    /// Serve `/` as a redirect to the remote simulator host and keep the
    /// entry/login pages uploaded there.
    pub simulator: bool,

    /// Open a browser tab once the server is listening.
    pub open: bool,

    /// Explicit base directory overrides per build mode.
    pub base_dirs: BaseDirs,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            build: "debug".into(),
            livereload: true,
            livereload_port: DEFAULT_LIVERELOAD_PORT,
            simulator: false,
            open: false,
            base_dirs: BaseDirs::default(),
        }
    }
}

/// `[serve.base_dirs]`: explicit base directories, relative to the project
/// root. When unset, the conventional candidates are probed instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseDirs {
    pub debug: Option<PathBuf>,
    pub release: Option<PathBuf>,
}

impl BaseDirs {
    /// The explicit override for a build mode, if configured.
    pub fn for_mode(&self, mode: BuildMode) -> Option<&Path> {
        match mode {
            BuildMode::Debug => self.debug.as_deref(),
            BuildMode::Release => self.release.as_deref(),
        }
    }
}

impl ProgramConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file; a missing file is
    /// not an error (everything has a default). The project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = find_config_file(&cli.config);

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let root = match &config_path {
            Some(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            None => std::env::current_dir().context("Failed to get current working directory")?,
        };

        config.root = crate::utils::path::normalize_path(&root);
        config.config_path = config_path;
        config.normalize_base_dirs();
        config.apply_command_options(cli);

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "ignoring unknown fields in {}:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Expand `~` in explicit base dirs. Existence is checked at resolve
    /// time so the error can name the configured value.
    fn normalize_base_dirs(&mut self) {
        for dir in [&mut self.serve.base_dirs.debug, &mut self.serve.base_dirs.release] {
            if let Some(path) = dir.take() {
                let expanded = shellexpand::tilde(path.to_str().unwrap_or_default()).into_owned();
                *dir = Some(PathBuf::from(expanded));
            }
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve { serve_args } => {
                crate::logger::set_verbose(serve_args.verbose);

                Self::update_option(&mut self.serve.port, serve_args.port.as_ref());
                Self::update_option(&mut self.serve.interface, serve_args.interface.as_ref());
                Self::update_option(&mut self.serve.build, serve_args.build.as_ref());
                Self::update_option(&mut self.serve.livereload, serve_args.livereload.as_ref());
                Self::update_option(
                    &mut self.serve.livereload_port,
                    serve_args.livereload_port.as_ref(),
                );
                Self::update_option(&mut self.app.app_id, serve_args.app_id.clone().map(Some).as_ref());
                Self::update_option(&mut self.app.api_url, serve_args.api_url.clone().map(Some).as_ref());

                if serve_args.simulator {
                    self.serve.simulator = true;
                }
                if serve_args.open {
                    self.serve.open = true;
                }
            }
            Commands::Render { args } => {
                crate::logger::set_verbose(args.verbose);

                Self::update_option(&mut self.serve.build, args.build.as_ref());
                Self::update_option(&mut self.app.app_id, args.app_id.clone().map(Some).as_ref());
                Self::update_option(&mut self.app.api_url, args.api_url.clone().map(Some).as_ref());
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

/// Search upward from cwd for the config file. An absolute path is checked
/// directly.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.is_file().then(|| name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from a TOML string. Panics if there are unknown fields
/// (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProgramConfig {
    let (parsed, ignored) = ProgramConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.port, DEFAULT_PORT);
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(config.serve.build, "debug");
        assert!(config.serve.livereload);
        assert_eq!(config.serve.livereload_port, DEFAULT_LIVERELOAD_PORT);
        assert!(!config.serve.simulator);
        assert!(config.app.app_id.is_none());
    }

    #[test]
    fn test_serve_overrides() {
        let config = test_parse_config(
            "[serve]\nport = 4000\nbuild = \"release\"\nlivereload = false\nsimulator = true",
        );
        assert_eq!(config.serve.port, 4000);
        assert_eq!(config.serve.build, "release");
        assert!(!config.serve.livereload);
        assert!(config.serve.simulator);
    }

    #[test]
    fn test_app_section() {
        let config =
            test_parse_config("[app]\napp_id = \"abc123\"\napi_url = \"http://localhost:9999\"");
        assert_eq!(config.app.app_id.as_deref(), Some("abc123"));
        assert_eq!(config.app.api_url.as_deref(), Some("http://localhost:9999"));
    }

    #[test]
    fn test_base_dirs() {
        let config =
            test_parse_config("[serve.base_dirs]\ndebug = \"client/src\"\nrelease = \"client/dist\"");
        assert_eq!(
            config.serve.base_dirs.for_mode(BuildMode::Debug),
            Some(Path::new("client/src"))
        );
        assert_eq!(
            config.serve.base_dirs.for_mode(BuildMode::Release),
            Some(Path::new("client/dist"))
        );
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 3000\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ProgramConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 3000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ProgramConfig::parse_with_ignored("[serve\nport = 3000");
        assert!(result.is_err());
    }
}
