//! Base directory and entry-page resolution.
//!
//! Given the working directory, the requested build mode and any explicit
//! base-directory overrides, produce the effective `{base_dir, index_page,
//! login_page}` for the run. Resolution is deterministic and side-effect-free
//! (existence probes only), so it can run repeatedly in tests.

use std::path::{Path, PathBuf};

use crate::api::RemoteApp;
use crate::config::ProgramConfig;
use crate::error::YokeError;
use crate::utils::path::normalize_path;

/// Conventional base directory candidates, probed in order.
const DEBUG_BASE_DIRS: [&str; 2] = ["src", "app"];
const RELEASE_BASE_DIRS: [&str; 2] = ["dist", "build"];

/// Entry-page candidates, probed in order. `.md` pages go through the
/// markdown preprocessor at render time.
const INDEX_CANDIDATES: [&str; 2] = ["index.html", "index.md"];
const LOGIN_CANDIDATES: [&str; 2] = ["login.html", "login.md"];

/// Build mode selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Parse a user-supplied mode string.
    pub fn parse(value: &str) -> Result<Self, YokeError> {
        match value {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(YokeError::invalid_build_mode(other)),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    const fn base_dir_candidates(self) -> &'static [&'static str] {
        match self {
            Self::Debug => &DEBUG_BASE_DIRS,
            Self::Release => &RELEASE_BASE_DIRS,
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The effective directories and pages for a run. Fixed at startup;
/// never changes for the run's lifetime.
#[derive(Debug, Clone)]
pub struct ResolvedPages {
    pub mode: BuildMode,
    pub base_dir: PathBuf,
    pub index_page: PathBuf,
    pub login_page: Option<PathBuf>,
}

/// Resolve the base directory and entry pages for the configured build mode.
pub fn resolve_pages(config: &ProgramConfig, app: &RemoteApp) -> Result<ResolvedPages, YokeError> {
    let mode = BuildMode::parse(&config.serve.build)?;
    let base_dir = resolve_base_dir(config, mode)?;

    let index_page =
        take_first_exists(&base_dir, &INDEX_CANDIDATES).ok_or_else(|| YokeError::MissingEntryPage {
            dir: base_dir.clone(),
            candidates: INDEX_CANDIDATES.join(", "),
        })?;

    let login_page = if app.requires_login_page() {
        let page = take_first_exists(&base_dir, &LOGIN_CANDIDATES).ok_or_else(|| {
            YokeError::MissingLoginPage {
                dir: base_dir.clone(),
                candidates: LOGIN_CANDIDATES.join(", "),
            }
        })?;
        Some(page)
    } else {
        None
    };

    Ok(ResolvedPages {
        mode,
        base_dir,
        index_page,
        login_page,
    })
}

/// Resolve the base directory: explicit override first, then the
/// conventional candidates for the mode, then the project root itself.
fn resolve_base_dir(config: &ProgramConfig, mode: BuildMode) -> Result<PathBuf, YokeError> {
    let root = &config.root;

    if let Some(explicit) = config.serve.base_dirs.for_mode(mode) {
        let dir = root.join(explicit);
        if dir.is_dir() {
            return Ok(normalize_path(&dir));
        }
        return Err(YokeError::MissingDirectory {
            mode: mode.as_str(),
            dir: explicit.to_path_buf(),
        });
    }

    let conventional = mode
        .base_dir_candidates()
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|dir| dir.is_dir());

    Ok(normalize_path(&conventional.unwrap_or_else(|| root.clone())))
}

/// Probe candidate file names under `base`, first that exists wins.
fn take_first_exists(base: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| base.join(name))
        .find(|path| path.is_file())
        .map(|path| normalize_path(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_at(root: &Path, extra: &str) -> ProgramConfig {
        let mut config = crate::config::test_parse_config(extra);
        config.root = root.to_path_buf();
        config
    }

    fn touch(path: &Path) {
        fs::write(path, "<html><head></head><body></body></html>").unwrap();
    }

    #[test]
    fn test_debug_uses_src_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        touch(&tmp.path().join("src/index.html"));

        let resolved = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap();
        assert_eq!(resolved.base_dir, tmp.path().join("src").canonicalize().unwrap());
        assert_eq!(resolved.mode, BuildMode::Debug);
    }

    #[test]
    fn test_debug_falls_back_to_app_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("app")).unwrap();
        touch(&tmp.path().join("app/index.html"));

        let resolved = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap();
        assert_eq!(resolved.base_dir, tmp.path().join("app").canonicalize().unwrap());
    }

    #[test]
    fn test_release_uses_dist_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("dist")).unwrap();
        // src exists too, but must not win in release mode
        fs::create_dir(tmp.path().join("src")).unwrap();
        touch(&tmp.path().join("dist/index.html"));

        let config = config_at(tmp.path(), "[serve]\nbuild = \"release\"");
        let resolved = resolve_pages(&config, &RemoteApp::default()).unwrap();
        assert_eq!(resolved.base_dir, tmp.path().join("dist").canonicalize().unwrap());
        assert_eq!(resolved.mode, BuildMode::Release);
    }

    #[test]
    fn test_no_convention_dir_falls_back_to_root() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));

        let resolved = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap();
        assert_eq!(resolved.base_dir, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_entry_page() {
        let tmp = TempDir::new().unwrap();

        let err = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Could not find any of the following"), "{msg}");
        assert!(msg.contains("index.html"));
    }

    #[test]
    fn test_invalid_build_mode() {
        let tmp = TempDir::new().unwrap();
        let config = config_at(tmp.path(), "[serve]\nbuild = \"invalid\"");

        let err = resolve_pages(&config, &RemoteApp::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid build option value"));
    }

    #[test]
    fn test_explicit_base_dir_missing() {
        let tmp = TempDir::new().unwrap();
        let config = config_at(tmp.path(), "[serve.base_dirs]\ndebug = \"missing\"");

        let err = resolve_pages(&config, &RemoteApp::default()).unwrap_err();
        assert!(err.to_string().contains("specified in yoke.toml does not exist"));
    }

    #[test]
    fn test_explicit_base_dir_wins_over_convention() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::create_dir(tmp.path().join("www")).unwrap();
        touch(&tmp.path().join("www/index.html"));

        let config = config_at(tmp.path(), "[serve.base_dirs]\ndebug = \"www\"");
        let resolved = resolve_pages(&config, &RemoteApp::default()).unwrap();
        assert_eq!(resolved.base_dir, tmp.path().join("www").canonicalize().unwrap());
    }

    #[test]
    fn test_markdown_index_variant() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.md"), "# hi").unwrap();

        let resolved = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap();
        assert!(resolved.index_page.ends_with("index.md"));
    }

    #[test]
    fn test_html_preferred_over_markdown() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));
        fs::write(tmp.path().join("index.md"), "# hi").unwrap();

        let resolved = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap();
        assert!(resolved.index_page.ends_with("index.html"));
    }

    #[test]
    fn test_login_page_required_by_auth() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));

        let app = RemoteApp::with_auth("oauth");
        let err = resolve_pages(&config_at(tmp.path(), ""), &app).unwrap_err();
        assert!(matches!(err, YokeError::MissingLoginPage { .. }));

        touch(&tmp.path().join("login.html"));
        let resolved = resolve_pages(&config_at(tmp.path(), ""), &app).unwrap();
        assert!(resolved.login_page.is_some());
    }

    #[test]
    fn test_no_login_page_without_auth() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));

        let resolved = resolve_pages(&config_at(tmp.path(), ""), &RemoteApp::default()).unwrap();
        assert!(resolved.login_page.is_none());
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        touch(&tmp.path().join("src/index.html"));

        let config = config_at(tmp.path(), "");
        let first = resolve_pages(&config, &RemoteApp::default()).unwrap();
        let second = resolve_pages(&config, &RemoteApp::default()).unwrap();
        assert_eq!(first.base_dir, second.base_dir);
        assert_eq!(first.index_page, second.index_page);
    }
}
