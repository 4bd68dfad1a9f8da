//! Live-reload notifier.
//!
//! A small server on its own port that accepts browser subscriptions over
//! WebSocket and pushes "changed" events for specific URL paths. The same
//! listener answers plain `GET /livereload.js` with the embedded client.

mod clients;
mod message;
mod server;

pub use clients::ReloadClients;
pub use message::ReloadMessage;
pub use server::{ReloadHandle, start_reload_server};
