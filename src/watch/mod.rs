//! File watching and change propagation.
//!
//! The notify watcher starts before the server accepts requests, so changes
//! arriving during startup are buffered rather than lost. Raw notify events
//! are bridged onto a tokio channel and drained by the router, which turns
//! them into reload notifications and simulator uploads.

pub mod router;
mod watcher;

pub use watcher::{FileWatcher, WatchedFiles};

use std::sync::Arc;
use std::sync::mpsc::Receiver as StdReceiver;
use std::time::Duration;

use crossbeam::channel;

use crate::cli::serve::ServeContext;
use crate::log;

/// Drain file-change events until shutdown.
///
/// Runs inside the watch-system runtime spawned by the serve lifecycle.
pub async fn run(
    ctx: Arc<ServeContext>,
    notify_rx: StdReceiver<notify::Result<notify::Event>>,
    shutdown_rx: channel::Receiver<()>,
) {
    // Bridge the sync notify channel into async (notify has no async API)
    let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if async_tx.blocking_send(event).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(e) => log!("watch"; "notify error: {}", e),
            }
        }
    });

    let mut shutdown_tick = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            biased;
            Some(event) = async_rx.recv() => router::handle_event(&event, &ctx),
            _ = shutdown_tick.tick() => {
                if crate::core::is_shutdown() || shutdown_rx.try_recv().is_ok() {
                    break;
                }
            }
        }
    }
}
