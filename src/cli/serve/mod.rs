//! Local preview server with live reload support.

mod lifecycle;
mod path;
mod response;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tiny_http::{Request, Server};

use crate::api::{ApiClient, RemoteApp, SimulatorSink};
use crate::config::{ProgramConfig, ResolvedPages, resolve_pages};
use crate::core::{self, ServerPhase};
use crate::error::YokeError;
use crate::preprocess::PreprocessorRegistry;
use crate::reload::{ReloadHandle, start_reload_server};
use crate::render::{PageRole, RenderOptions, render_page};
use crate::utils::path::normalize_path;
use crate::watch::{FileWatcher, WatchedFiles, router};
use crate::{debug, log, logger};

/// Everything a request handler needs, owned by the serve command for the
/// run's lifetime. There is no module-level mutable state: the watched-file
/// registry, the reload broadcaster and the platform client all live here.
pub struct ServeContext {
    pub config: ProgramConfig,
    pub app: RemoteApp,
    pub pages: ResolvedPages,
    pub preprocessors: PreprocessorRegistry,
    pub watched: WatchedFiles,
    pub watcher: FileWatcher,
    pub reload: Option<ReloadHandle>,
    pub sync: Option<Arc<dyn SimulatorSink>>,
}

impl ServeContext {
    /// Render options for the current run. The livereload port is the port
    /// the notifier actually bound, which may differ from the configured one.
    pub fn render_options(&self) -> RenderOptions<'_> {
        RenderOptions {
            mode: self.pages.mode,
            port: self.config.serve.port,
            livereload_port: self.reload.as_ref().map(|handle| handle.port),
            app: &self.app,
            app_id: self.config.app.app_id.as_deref(),
            app_name: self.config.app.name.as_deref(),
        }
    }

    /// Path of a resolved page by role.
    pub fn page_path(&self, role: PageRole) -> Option<&Path> {
        match role {
            PageRole::Index => Some(&self.pages.index_page),
            PageRole::Login => self.pages.login_page.as_deref(),
        }
    }
}

/// Run the serve command until shutdown.
pub fn run(config: ProgramConfig) -> Result<()> {
    let api = ApiClient::from_config(&config)?;

    if config.serve.simulator && api.is_none() {
        return Err(YokeError::InvalidConfig(
            "simulator mode requires app.app_id and app.api_url".into(),
        )
        .into());
    }

    // Fetch the app snapshot so env settings and the SSL requirement are
    // known before any port is bound.
    let app = match &api {
        Some(client) => {
            log!("serve"; "fetching app info from the platform API");
            client.fetch_app()?
        }
        None => RemoteApp::default(),
    };

    let pages = resolve_pages(&config, &app)?;
    debug!("serve"; "base directory {}", pages.base_dir.display());
    debug!("serve"; "entry page {}", pages.index_page.display());

    let preprocessors = PreprocessorRegistry::with_defaults(pages.mode);
    let (watcher, notify_rx) = FileWatcher::new()?;

    let reload = if config.serve.livereload {
        let handle = start_reload_server(config.serve.livereload_port)?;
        log!("reload"; "livereload listening on port {}", handle.port);
        Some(handle)
    } else {
        None
    };

    let sync: Option<Arc<dyn SimulatorSink>> = match (config.serve.simulator, api) {
        (true, Some(client)) => Some(Arc::new(client)),
        _ => None,
    };

    let ctx = Arc::new(ServeContext {
        config,
        app,
        pages,
        preprocessors,
        watched: WatchedFiles::new(),
        watcher,
        reload,
        sync,
    });

    // Entry pages are watched from the start; other assets join the watched
    // set as they are requested.
    if ctx.config.serve.livereload {
        watch_entry_pages(&ctx);
    }

    if ctx.config.serve.simulator {
        router::sync_startup_pages(&ctx);
    }

    let (server, url) = lifecycle::bind_server(&ctx)?;

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded::<()>();
    core::register_server(Arc::clone(&server), shutdown_tx);
    core::set_phase(ServerPhase::Listening);
    log!("serve"; "app running at {url}");

    if ctx.config.serve.open {
        lifecycle::open_browser(&url);
    }

    let watch_handle = if ctx.config.serve.livereload {
        lifecycle::spawn_watch_system(Arc::clone(&ctx), notify_rx, shutdown_rx)
    } else {
        None
    };

    run_request_loop(&server, &ctx);

    core::set_phase(ServerPhase::Stopping);
    if let Some(reload) = &ctx.reload {
        reload.close_all();
    }
    lifecycle::wait_for_shutdown(watch_handle);
    core::set_phase(ServerPhase::Stopped);

    Ok(())
}

fn watch_entry_pages(ctx: &ServeContext) {
    let mut pages = vec![ctx.pages.index_page.clone()];
    if let Some(login) = &ctx.pages.login_page {
        pages.push(login.clone());
    }
    for page in pages {
        if let Err(e) = ctx.watcher.watch_file(&page) {
            debug!("watch"; "cannot watch {}: {}", page.display(), e);
        }
    }
}

fn run_request_loop(server: &Arc<Server>, ctx: &Arc<ServeContext>) {
    // Use a thread pool to handle requests concurrently so a slow
    // preprocessor run does not block other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        pool.spawn(move || handle_request(request, &ctx));
    }
}

/// Handle a single HTTP request.
fn handle_request(request: Request, ctx: &ServeContext) {
    let url = request.url().to_string();

    if core::is_shutdown() {
        let _ = response::respond_unavailable(request);
        return;
    }

    // Watch-registration middleware: any file the page requests joins the
    // watched set, exactly once.
    if ctx.config.serve.livereload {
        register_for_watch(&url, ctx);
    }

    match route(request, ctx) {
        Ok(status) => logger::request(status, &url),
        Err(e) => log!("serve"; "request error: {e}"),
    }
}

/// Route a request to its responder. Returns the status code sent.
fn route(request: Request, ctx: &ServeContext) -> Result<u16> {
    let url = request.url().to_string();
    let clean = path::normalize_url(&url);

    // Entry page (or simulator redirect) at /
    if clean.is_empty() {
        if ctx.config.serve.simulator
            && let Some(simulator_url) = ctx.app.url.as_deref()
        {
            return response::respond_redirect(request, simulator_url);
        }

        return match render_page(&ctx.pages.index_page, &ctx.preprocessors, &ctx.render_options())
        {
            Ok(html) => response::respond_html(request, html),
            Err(e) => response::respond_error(request, &e),
        };
    }

    // Static assets, preprocessed when an implementation is registered for
    // the extension
    if let Some(file) = path::resolve_static(&url, &ctx.pages.base_dir) {
        if let Some(preprocessor) = ctx.preprocessors.for_path(&file) {
            return match preprocessor.transform(&file) {
                Ok(transformed) => response::respond_transformed(request, transformed),
                Err(e) => response::respond_error(request, &e),
            };
        }
        return response::respond_file(request, &file);
    }

    // Anything not served above is a 404
    response::respond_not_found(request)
}

/// Add the file behind a URL to the watched set, exactly once per path.
fn register_for_watch(url: &str, ctx: &ServeContext) {
    let Some((target, url_path)) =
        path::watch_target(url, &ctx.pages.base_dir, &ctx.pages.index_page)
    else {
        return;
    };

    let target = normalize_path(&target);
    if ctx.watched.register(target.clone(), url_path) {
        debug!("watch"; "watching file {} for changes", target.display());
        if let Err(e) = ctx.watcher.watch_file(&target) {
            debug!("watch"; "cannot watch {}: {}", target.display(), e);
        }
    }
}
