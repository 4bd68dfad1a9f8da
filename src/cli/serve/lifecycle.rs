//! Server lifecycle management.

use std::{
    net::SocketAddr,
    sync::Arc,
    sync::mpsc::Receiver as StdReceiver,
    thread::{self, JoinHandle},
};

use crossbeam::channel;
use tiny_http::{Server, SslConfig};

use super::ServeContext;
use crate::error::YokeError;
use crate::{debug, embed, log, watch};

/// Bind the HTTP(S) listener.
///
/// A bind failure on the configured port is fatal; unlike the livereload
/// listener there is no port retry here.
pub fn bind_server(ctx: &ServeContext) -> Result<(Arc<Server>, String), YokeError> {
    let addr = SocketAddr::new(ctx.config.serve.interface, ctx.config.serve.port);

    let result = if ctx.app.require_ssl {
        // The app requires SSL: serve with the bundled self-signed
        // development certificate.
        Server::https(
            addr,
            SslConfig {
                certificate: embed::certs::SERVER_CRT.to_vec(),
                private_key: embed::certs::SERVER_KEY.to_vec(),
            },
        )
    } else {
        Server::http(addr)
    };

    let server = result.map_err(|e| YokeError::Bind {
        addr: addr.to_string(),
        message: e.to_string(),
    })?;

    let scheme = if ctx.app.require_ssl { "https" } else { "http" };
    let url = format!("{scheme}://localhost:{}", ctx.config.serve.port);

    Ok((Arc::new(server), url))
}

/// Spawn the watch system for file watching and live reload.
pub fn spawn_watch_system(
    ctx: Arc<ServeContext>,
    notify_rx: StdReceiver<notify::Result<notify::Event>>,
    shutdown_rx: channel::Receiver<()>,
) -> Option<JoinHandle<()>> {
    Some(thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime");

        rt.block_on(watch::run(ctx, notify_rx, shutdown_rx));
    }))
}

/// Wait for the watch system to shut down gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }
}

/// Open a browser tab pointed at the local server.
pub fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = std::process::Command::new("open");
        c.arg(url);
        c
    };
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", url]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(url);
        c
    };

    match command.spawn() {
        Ok(_) => log!("serve"; "opening {url}"),
        Err(e) => debug!("serve"; "could not open browser: {e}"),
    }
}
