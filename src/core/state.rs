//! Server phase tracking and shutdown handling.
//!
//! The local server moves through four phases:
//! `starting -> listening -> stopping -> stopped`. Transitions are driven by
//! a successful bind, a shutdown request (Ctrl+C) and teardown completion.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Lifecycle phase of the local server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerPhase {
    Starting = 0,
    Listening = 1,
    Stopping = 2,
    Stopped = 3,
}

static PHASE: AtomicU8 = AtomicU8::new(ServerPhase::Starting as u8);

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the watch system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Get the current server phase.
pub fn phase() -> ServerPhase {
    match PHASE.load(Ordering::SeqCst) {
        0 => ServerPhase::Starting,
        1 => ServerPhase::Listening,
        2 => ServerPhase::Stopping,
        _ => ServerPhase::Stopped,
    }
}

/// Advance the server phase. Phases only move forward; an attempt to move
/// backwards is ignored.
pub fn set_phase(next: ServerPhase) {
    PHASE.fetch_max(next as u8, Ordering::SeqCst);
}

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// The handler behavior depends on whether a server has been registered:
/// - Before `register_server()`: sets the shutdown flag and exits
/// - After `register_server()`: graceful shutdown (unblock server, notify watch system)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        set_phase(ServerPhase::Stopping);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown.
///
/// Call this after binding the server, before entering the request loop.
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested.
///
/// Uses Relaxed ordering for performance - worst case is serving
/// a few more requests before refusing connections.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_moves_forward_only() {
        PHASE.store(ServerPhase::Starting as u8, Ordering::SeqCst);
        assert_eq!(phase(), ServerPhase::Starting);

        set_phase(ServerPhase::Listening);
        assert_eq!(phase(), ServerPhase::Listening);

        set_phase(ServerPhase::Stopping);
        set_phase(ServerPhase::Listening);
        assert_eq!(phase(), ServerPhase::Stopping);

        set_phase(ServerPhase::Stopped);
        assert_eq!(phase(), ServerPhase::Stopped);
    }
}
