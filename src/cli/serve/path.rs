//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Normalize URL: decode, strip query string, trim slashes.
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    let path = decoded.split('?').next().unwrap_or(&decoded);
    path.trim_matches('/').to_string()
}

/// The file a URL refers to, before any existence check, paired with the
/// URL path to notify on change. Used by the watch-registration middleware:
/// assets are registered as soon as they are requested, whether or not they
/// exist yet.
pub fn watch_target(url: &str, base_dir: &Path, index_page: &Path) -> Option<(PathBuf, String)> {
    let clean = normalize_url(url);

    if clean.is_empty() {
        return Some((index_page.to_path_buf(), "/".to_string()));
    }
    if clean.contains("..") {
        return None;
    }

    Some((base_dir.join(&clean), format!("/{clean}")))
}

/// Resolve a URL to an existing file under `base_dir`.
///
/// Canonicalizes to resolve symlinks and verifies the result stays under
/// the base directory, preventing traversal via symlinks or encoded
/// sequences. Directories are not served (no implicit directory index:
/// the entry page is only reachable at `/`).
pub fn resolve_static(url: &str, base_dir: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.is_empty() || clean.contains("..") {
        return None;
    }

    let local = base_dir.join(&clean);

    let canonical = local.canonicalize().ok()?;
    let base_canonical = base_dir.canonicalize().ok()?;

    if !canonical.starts_with(&base_canonical) {
        // Path escapes the base directory - reject
        return None;
    }

    canonical.is_file().then_some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/script.js"), "script.js");
        assert_eq!(normalize_url("/a/b.css?v=3"), "a/b.css");
        assert_eq!(normalize_url("/with%20space.txt"), "with space.txt");
        assert_eq!(normalize_url("/"), "");
    }

    #[test]
    fn test_resolve_static_serves_existing_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("app.js"), "js").unwrap();

        let resolved = resolve_static("/app.js", tmp.path()).unwrap();
        assert!(resolved.ends_with("app.js"));
    }

    #[test]
    fn test_resolve_static_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("www");
        fs::create_dir(&base).unwrap();
        fs::write(tmp.path().join("secret.txt"), "s").unwrap();

        assert!(resolve_static("/../secret.txt", &base).is_none());
        assert!(resolve_static("/%2e%2e/secret.txt", &base).is_none());
    }

    #[test]
    fn test_resolve_static_rejects_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("assets")).unwrap();

        assert!(resolve_static("/assets", tmp.path()).is_none());
    }

    #[test]
    fn test_resolve_static_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(resolve_static("/nope.js", tmp.path()).is_none());
    }

    #[test]
    fn test_watch_target_root_maps_to_index() {
        let (path, url) = watch_target(
            "/",
            Path::new("/proj/src"),
            Path::new("/proj/src/index.html"),
        )
        .unwrap();
        assert_eq!(path, Path::new("/proj/src/index.html"));
        assert_eq!(url, "/");
    }

    #[test]
    fn test_watch_target_asset() {
        let (path, url) = watch_target(
            "/js/app.js?cache=no",
            Path::new("/proj/src"),
            Path::new("/proj/src/index.html"),
        )
        .unwrap();
        assert_eq!(path, Path::new("/proj/src/js/app.js"));
        assert_eq!(url, "/js/app.js");
    }

    #[test]
    fn test_watch_target_rejects_traversal() {
        assert!(
            watch_target(
                "/../etc/passwd",
                Path::new("/proj/src"),
                Path::new("/proj/src/index.html")
            )
            .is_none()
        );
    }
}
