//! One-shot page rendering to stdout or a file.
//!
//! Exercises the resolver, preprocessors and renderer without starting a
//! server; handy for checking what the preview (or a simulator upload)
//! would contain.

use std::fs;

use anyhow::{Result, bail};

use crate::api::{ApiClient, RemoteApp};
use crate::cli::RenderArgs;
use crate::config::{ProgramConfig, resolve_pages};
use crate::preprocess::PreprocessorRegistry;
use crate::render::{PageRole, RenderOptions, render_page};
use crate::{debug, log};

pub fn run(config: ProgramConfig, args: &RenderArgs) -> Result<()> {
    let api = ApiClient::from_config(&config)?;
    let app = match &api {
        Some(client) => {
            debug!("render"; "fetching app info from the platform API");
            client.fetch_app()?
        }
        None => RemoteApp::default(),
    };

    let pages = resolve_pages(&config, &app)?;
    let registry = PreprocessorRegistry::with_defaults(pages.mode);

    let page = match args.page {
        PageRole::Index => pages.index_page.as_path(),
        PageRole::Login => match pages.login_page.as_deref() {
            Some(page) => page,
            None => bail!("no login page resolved for this app"),
        },
    };

    let opts = RenderOptions {
        mode: pages.mode,
        port: config.serve.port,
        livereload_port: None,
        app: &app,
        app_id: config.app.app_id.as_deref(),
        app_name: config.app.name.as_deref(),
    };

    let html = render_page(page, &registry, &opts)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &html)?;
            log!("render"; "wrote {}", path.display());
        }
        None => print!("{html}"),
    }

    Ok(())
}
