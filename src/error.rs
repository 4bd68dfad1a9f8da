//! Error taxonomy for the yoke CLI.
//!
//! Startup errors (`InvalidConfig`, `Missing*`, `Bind`) are fatal and surface
//! to the invoking command before the server accepts a single request.
//! Per-request errors (`PageRead`, `Preprocess`) are converted to HTTP 500
//! responses at the request boundary. Watch-loop errors (`RemoteSync`) are
//! logged as warnings and never escape their handler.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum YokeError {
    /// Malformed run configuration (bad build mode, simulator without app id).
    #[error("{0}")]
    InvalidConfig(String),

    /// An explicitly configured base directory does not exist.
    #[error("The {mode} base directory '{}' specified in yoke.toml does not exist", .dir.display())]
    MissingDirectory { mode: &'static str, dir: PathBuf },

    /// No entry page was found in the resolved base directory.
    #[error("Could not find any of the following pages in {}: {candidates}", .dir.display())]
    MissingEntryPage { dir: PathBuf, candidates: String },

    /// The app requires authentication but no login page was found.
    #[error("Could not find any of the following login pages in {}: {candidates}", .dir.display())]
    MissingLoginPage { dir: PathBuf, candidates: String },

    /// An entry page or asset could not be read.
    #[error("Failed to read page {}: {source}", .path.display())]
    PageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A registered preprocessor failed to transform its input.
    #[error("Preprocessor failed for {}: {message}", .path.display())]
    Preprocess { path: PathBuf, message: String },

    /// Uploading a rendered page to the simulator host failed.
    #[error("Simulator upload failed: {0}")]
    RemoteSync(String),

    /// The listen port is unavailable.
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    /// The platform API rejected the configured credentials.
    #[error("Unauthorized. Your userId and secretKey do not allow you to perform the requested action.")]
    Unauthorized,

    /// The platform API has no app with the configured identifier.
    #[error("App '{0}' not found")]
    AppNotFound(String),

    /// Any other platform API failure.
    #[error("Platform API error: {0}")]
    Api(String),
}

impl YokeError {
    /// Build the canonical invalid-build-mode error.
    pub fn invalid_build_mode(value: &str) -> Self {
        Self::InvalidConfig(format!(
            "Invalid build option value '{value}'. Valid values are 'debug' and 'release'."
        ))
    }
}
