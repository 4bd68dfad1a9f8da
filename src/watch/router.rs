//! Change-event routing.
//!
//! Decides, per changed path, whether to broadcast a reload for `/`
//! (entry pages, with a simulator re-upload first when that mode is on),
//! a reload scoped to an asset's URL path, or nothing at all. Events are
//! handled in arrival order with no coalescing: every change produces its
//! own notification.

use std::path::Path;

use notify::EventKind;

use crate::cli::serve::ServeContext;
use crate::config::ResolvedPages;
use crate::error::YokeError;
use crate::render::{PageRole, render_page};
use crate::utils::path::normalize_path;
use crate::watch::WatchedFiles;
use crate::{debug, log};

/// What a single changed path should trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    /// An entry page changed: reload `/` (after a simulator re-upload when
    /// that mode is active).
    Page(PageRole),
    /// A registered asset changed: reload its URL path.
    Asset(String),
    /// Not a tracked file.
    Ignore,
}

/// Classify a changed path against the resolved pages and the watched set.
pub fn classify(path: &Path, pages: &ResolvedPages, watched: &WatchedFiles) -> ChangeAction {
    if path == pages.index_page {
        return ChangeAction::Page(PageRole::Index);
    }
    if pages.login_page.as_deref() == Some(path) {
        return ChangeAction::Page(PageRole::Login);
    }
    if let Some(url) = watched.url_for(path) {
        return ChangeAction::Asset(url);
    }
    ChangeAction::Ignore
}

/// Handle one notify event.
pub fn handle_event(event: &notify::Event, ctx: &ServeContext) {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return;
    }

    for path in &event.paths {
        let path = normalize_path(path);
        debug!("watch"; "change to {} detected", path.display());

        match classify(&path, &ctx.pages, &ctx.watched) {
            ChangeAction::Page(role) => {
                if ctx.config.serve.simulator {
                    // The blocking HTTP client must not run on the async
                    // watch workers; hop onto a plain thread for the upload.
                    let result =
                        std::thread::scope(|scope| scope.spawn(|| sync_page(role, ctx)).join());
                    match result {
                        Ok(Err(e)) => log!("warning"; "{e}"),
                        Err(_) => log!("warning"; "simulator upload thread panicked"),
                        Ok(Ok(())) => {}
                    }
                }
                broadcast(ctx, "/");
            }
            ChangeAction::Asset(url) => {
                broadcast(ctx, &url);
            }
            ChangeAction::Ignore => {}
        }
    }
}

/// Render a page and upload it to the simulator host.
pub fn sync_page(role: PageRole, ctx: &ServeContext) -> Result<(), YokeError> {
    let Some(sync) = &ctx.sync else {
        return Ok(());
    };
    let Some(page) = ctx.page_path(role) else {
        return Ok(());
    };

    let html = render_page(page, &ctx.preprocessors, &ctx.render_options())?;
    sync.upload_page(role, &html)?;
    log!("serve"; "uploaded {} page to simulator host", role.field_name());
    Ok(())
}

/// Upload every resolved page once. Called at serve startup in simulator
/// mode; failures are warnings, not fatal.
pub fn sync_startup_pages(ctx: &ServeContext) {
    let mut roles = vec![PageRole::Index];
    if ctx.pages.login_page.is_some() {
        roles.push(PageRole::Login);
    }
    for role in roles {
        if let Err(e) = sync_page(role, ctx) {
            log!("warning"; "{e}");
        }
    }
}

fn broadcast(ctx: &ServeContext, path: &str) {
    if let Some(reload) = &ctx.reload {
        log!("watch"; "livereload triggered by change to {path}");
        reload.broadcast_reload(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildMode;
    use std::path::PathBuf;

    fn pages() -> ResolvedPages {
        ResolvedPages {
            mode: BuildMode::Debug,
            base_dir: PathBuf::from("/proj/src"),
            index_page: PathBuf::from("/proj/src/index.html"),
            login_page: Some(PathBuf::from("/proj/src/login.html")),
        }
    }

    #[test]
    fn test_entry_page_change_scopes_to_root() {
        let watched = WatchedFiles::new();
        let action = classify(Path::new("/proj/src/index.html"), &pages(), &watched);
        assert_eq!(action, ChangeAction::Page(PageRole::Index));
    }

    #[test]
    fn test_login_page_change() {
        let watched = WatchedFiles::new();
        let action = classify(Path::new("/proj/src/login.html"), &pages(), &watched);
        assert_eq!(action, ChangeAction::Page(PageRole::Login));
    }

    #[test]
    fn test_registered_asset_scopes_to_its_url() {
        let watched = WatchedFiles::new();
        watched.register(PathBuf::from("/proj/src/script.js"), "/script.js".into());

        let action = classify(Path::new("/proj/src/script.js"), &pages(), &watched);
        assert_eq!(action, ChangeAction::Asset("/script.js".into()));
    }

    #[test]
    fn test_unregistered_file_is_ignored() {
        let watched = WatchedFiles::new();
        let action = classify(Path::new("/proj/src/notes.txt"), &pages(), &watched);
        assert_eq!(action, ChangeAction::Ignore);
    }

    #[test]
    fn test_entry_page_wins_over_asset_registration() {
        // The middleware registers "/" -> index page too; the page branch
        // must still win so simulator sync happens.
        let watched = WatchedFiles::new();
        watched.register(PathBuf::from("/proj/src/index.html"), "/".into());

        let action = classify(Path::new("/proj/src/index.html"), &pages(), &watched);
        assert_eq!(action, ChangeAction::Page(PageRole::Index));
    }
}
