//! Subscribed browser clients and broadcast delivery.

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::ReloadMessage;
use crate::{debug, log};

/// Registry of connected live-reload subscribers.
///
/// Cloneable handle; the underlying list is shared between the acceptor
/// thread and the watch loop.
#[derive(Clone, Default)]
pub struct ReloadClients {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
}

impl ReloadClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the WebSocket handshake and register the client.
    pub fn add_client(&self, stream: TcpStream) {
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let greeting = ReloadMessage::connected().to_json();
                if let Err(e) = ws.send(Message::Text(greeting.into())) {
                    log!("reload"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                clients.push(ws);
                debug!("reload"; "client connected (total: {})", clients.len());
            }
            Err(e) => {
                log!("reload"; "handshake failed: {}", e);
            }
        }
    }

    /// Broadcast a message to all connected clients, pruning any that have
    /// gone away.
    pub fn broadcast(&self, msg: &ReloadMessage) {
        let frame = Message::Text(msg.to_json().into());

        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            debug!("reload"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| match client.send(frame.clone()) {
            Ok(_) => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        debug!("reload"; "broadcast to {} clients", count);
    }

    /// Close every connection. Used during shutdown.
    pub fn close_all(&self) {
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.close(None);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}
