//! Page rendering.
//!
//! Loads an entry page (through a preprocessor when one is registered for
//! its extension), strips markup tagged for a non-matching build, injects
//! the runtime-configuration script and the optional live-reload client tag,
//! and returns the final markup. Rendering is pure given its inputs: every
//! invocation re-reads and re-renders so a reload always reflects the latest
//! edits.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::api::RemoteApp;
use crate::config::BuildMode;
use crate::error::YokeError;
use crate::preprocess::PreprocessorRegistry;
use crate::utils::html::splice_before;

/// Attribute marking an element as belonging to one build mode.
pub const BUILD_ATTR: &str = "data-aero-build";

/// Role of a rendered page; also the multipart field name used by
/// simulator uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    Index,
    Login,
}

impl PageRole {
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Login => "login",
        }
    }
}

impl FromStr for PageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(Self::Index),
            "login" => Ok(Self::Login),
            other => Err(format!("unknown page role '{other}', expected 'index' or 'login'")),
        }
    }
}

/// Inputs that shape a single render.
pub struct RenderOptions<'a> {
    pub mode: BuildMode,
    /// Local server port; becomes the asset host in the runtime config.
    pub port: u16,
    /// When set, the live-reload client tag is appended to the body.
    pub livereload_port: Option<u16>,
    pub app: &'a RemoteApp,
    /// App identifier override (config wins over platform metadata).
    pub app_id: Option<&'a str>,
    /// Display name override.
    pub app_name: Option<&'a str>,
}

/// Runtime configuration injected into the page head.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig<'a> {
    app_id: &'a str,
    app_name: &'a str,
    env: serde_json::Map<String, serde_json::Value>,
    cdn_host: String,
    cdn_url: String,
    version_id: &'static str,
    version_name: &'static str,
    app_host: &'static str,
    build_type: &'a str,
}

/// Render a page to final markup.
pub fn render_page(
    page: &Path,
    registry: &PreprocessorRegistry,
    opts: &RenderOptions,
) -> Result<String, YokeError> {
    let html = load_page(page, registry)?;
    let html = strip_build_tags(&html, opts.mode);
    let html = inject_runtime_config(&html, opts);

    Ok(match opts.livereload_port {
        Some(port) => inject_livereload_tag(&html, port),
        None => html,
    })
}

/// Load page markup, via the registered preprocessor when there is one.
fn load_page(page: &Path, registry: &PreprocessorRegistry) -> Result<String, YokeError> {
    if let Some(preprocessor) = registry.for_path(page) {
        return Ok(preprocessor.transform(page)?.content);
    }

    fs::read_to_string(page).map_err(|e| YokeError::PageRead {
        path: page.to_path_buf(),
        source: e,
    })
}

/// Remove every element whose build attribute names a different mode.
/// Elements without the attribute are always kept.
fn strip_build_tags(html: &str, mode: BuildMode) -> String {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return html.to_string();
    };

    let mut result = html.to_string();

    // Nodes come back in document order, so an outer tagged element is
    // removed before any tagged element nested inside it; the nested
    // removal then finds nothing and is a no-op.
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else { continue };

        let mut build_value = None;
        for (key, value) in tag.attributes().iter() {
            if key.as_ref() == BUILD_ATTR {
                build_value = Some(value.map(|v| v.to_string()).unwrap_or_default());
                break;
            }
        }
        let Some(value) = build_value else { continue };

        if value == mode.as_str() {
            continue;
        }

        let raw = tag.raw().as_utf8_str();
        if let Some(pos) = result.find(raw.as_ref()) {
            result.replace_range(pos..pos + raw.len(), "");
        }
    }

    result
}

/// Inject the runtime-configuration script into the head (or at the start
/// of the document when no head exists).
fn inject_runtime_config(html: &str, opts: &RenderOptions) -> String {
    let app_id = opts.app_id.unwrap_or(&opts.app.app_id);
    let app_name = opts
        .app_name
        .or(opts.app.name.as_deref())
        .unwrap_or(app_id);

    let config = RuntimeConfig {
        app_id,
        app_name,
        env: opts.app.client_env(),
        cdn_host: format!("localhost:{}", opts.port),
        cdn_url: format!("//localhost:{}", opts.port),
        version_id: "local",
        version_name: "local",
        app_host: "localhost",
        build_type: opts.mode.as_str(),
    };

    let json = serde_json::to_string(&config).unwrap_or_else(|_| "{}".into());
    let script = format!("<script>__yoke__ = {json};</script>");

    splice_before(html, "</head>", &script).unwrap_or_else(|| format!("{script}{html}"))
}

/// Append the live-reload client tag to the end of the body (or the end of
/// the document when no body close tag exists).
fn inject_livereload_tag(html: &str, port: u16) -> String {
    let tag = format!("<script src=\"//localhost:{port}/livereload.js\"></script>");
    splice_before(html, "</body>", &tag).unwrap_or_else(|| format!("{html}{tag}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SHELL: &str = "<html><head></head><body>BODY</body></html>";

    fn options(app: &RemoteApp) -> RenderOptions<'_> {
        RenderOptions {
            mode: BuildMode::Debug,
            port: 3000,
            livereload_port: None,
            app,
            app_id: Some("abc123"),
            app_name: None,
        }
    }

    fn write_page(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn registry() -> PreprocessorRegistry {
        PreprocessorRegistry::with_defaults(BuildMode::Debug)
    }

    #[test]
    fn test_strip_keeps_matching_and_untagged() {
        let html = "<div data-aero-build=\"release\">R</div>\
                    <div data-aero-build=\"debug\">D</div>\
                    <div>Always</div>";

        let out = strip_build_tags(html, BuildMode::Debug);
        assert!(out.contains('D'));
        assert!(out.contains("Always"));
        assert!(!out.contains('R'));

        let out = strip_build_tags(html, BuildMode::Release);
        assert!(out.contains('R'));
        assert!(out.contains("Always"));
        assert!(!out.contains('D'));
    }

    #[test]
    fn test_strip_removes_nested_content() {
        let html = "<section data-aero-build=\"release\"><p>inner</p></section><p>kept</p>";
        let out = strip_build_tags(html, BuildMode::Debug);
        assert!(!out.contains("inner"));
        assert!(out.contains("kept"));
    }

    #[test]
    fn test_runtime_config_injected_into_head() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(&tmp, "index.html", SHELL);

        let out = render_page(&page, &registry(), &options(&app)).unwrap();

        let head_end = out.find("</head>").unwrap();
        let script_pos = out.find("__yoke__").unwrap();
        assert!(script_pos < head_end);
        assert!(out.contains("\"appId\":\"abc123\""));
        assert!(out.contains("\"cdnUrl\":\"//localhost:3000\""));
        assert!(out.contains("\"versionId\":\"local\""));
        assert!(out.contains("\"buildType\":\"debug\""));
    }

    #[test]
    fn test_env_settings_injected() {
        let tmp = TempDir::new().unwrap();
        let app: RemoteApp = serde_json::from_str(
            r#"{"configSettings": [
                {"key": "THEME", "value": "dark"},
                {"key": "SECRET", "value": "x", "serverOnly": true}
            ]}"#,
        )
        .unwrap();
        let page = write_page(&tmp, "index.html", SHELL);

        let out = render_page(&page, &registry(), &options(&app)).unwrap();
        assert!(out.contains("\"THEME\":\"dark\""));
        assert!(!out.contains("SECRET"));
    }

    #[test]
    fn test_livereload_tag_appended_to_body() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(&tmp, "index.html", SHELL);

        let mut opts = options(&app);
        opts.livereload_port = Some(35728);
        let out = render_page(&page, &registry(), &opts).unwrap();

        let tag_pos = out.find("//localhost:35728/livereload.js").unwrap();
        let body_end = out.find("</body>").unwrap();
        assert!(tag_pos < body_end);
    }

    #[test]
    fn test_no_livereload_tag_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(&tmp, "index.html", SHELL);

        let out = render_page(&page, &registry(), &options(&app)).unwrap();
        assert!(!out.contains("livereload.js"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(
            &tmp,
            "index.html",
            "<html><head></head><body><div data-aero-build=\"debug\">D</div></body></html>",
        );

        let first = render_page(&page, &registry(), &options(&app)).unwrap();
        let second = render_page(&page, &registry(), &options(&app)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_rereads_source() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(&tmp, "index.html", SHELL);

        let first = render_page(&page, &registry(), &options(&app)).unwrap();
        assert!(first.contains("BODY"));

        fs::write(&page, "<html><head></head><body>CHANGED</body></html>").unwrap();
        let second = render_page(&page, &registry(), &options(&app)).unwrap();
        assert!(second.contains("CHANGED"));
    }

    #[test]
    fn test_missing_page_is_read_error() {
        let app = RemoteApp::default();
        let err = render_page(Path::new("/nonexistent/index.html"), &registry(), &options(&app));
        assert!(matches!(err, Err(YokeError::PageRead { .. })));
    }

    #[test]
    fn test_markdown_entry_page() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(&tmp, "index.md", "# Hello");

        let out = render_page(&page, &registry(), &options(&app)).unwrap();
        assert!(out.contains("<h1>Hello</h1>"));
        assert!(out.contains("__yoke__"));
    }

    #[test]
    fn test_document_without_head_still_renders() {
        let tmp = TempDir::new().unwrap();
        let app = RemoteApp::default();
        let page = write_page(&tmp, "index.html", "<div>bare</div>");

        let mut opts = options(&app);
        opts.livereload_port = Some(35728);
        let out = render_page(&page, &registry(), &opts).unwrap();
        assert!(out.contains("__yoke__"));
        assert!(out.contains("livereload.js"));
        assert!(out.contains("bare"));
    }

    #[test]
    fn test_page_role_parsing() {
        assert_eq!(PageRole::from_str("index").unwrap(), PageRole::Index);
        assert_eq!(PageRole::from_str("login").unwrap(), PageRole::Login);
        assert!(PageRole::from_str("admin").is_err());
        assert_eq!(PageRole::Login.field_name(), "login");
    }
}
