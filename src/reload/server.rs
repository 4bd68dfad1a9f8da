//! Live-reload listener.
//!
//! Accepts connections on the livereload port. Each connection is sniffed:
//! WebSocket upgrades become subscriptions, `GET /livereload.js` gets the
//! embedded client script over plain HTTP, anything else is a 404.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::Result;

use super::clients::ReloadClients;
use super::message::ReloadMessage;
use crate::embed::serve::{LIVERELOAD_JS, LivereloadVars};
use crate::{debug, log};

/// Maximum port retry attempts. The livereload port is advisory, so unlike
/// the HTTP listener it may slide upward when the base port is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Running notifier: the bound port plus the subscriber registry.
pub struct ReloadHandle {
    pub port: u16,
    clients: ReloadClients,
}

impl ReloadHandle {
    /// Push a reload notification scoped to a URL path.
    pub fn broadcast_reload(&self, path: &str) {
        self.clients.broadcast(&ReloadMessage::reload(path));
    }

    /// Close every subscriber connection. Used during shutdown.
    pub fn close_all(&self) {
        self.clients.close_all();
    }

    #[cfg(test)]
    pub fn clients(&self) -> &ReloadClients {
        &self.clients
    }
}

/// Bind the notifier and spawn its acceptor thread.
pub fn start_reload_server(base_port: u16) -> Result<ReloadHandle> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    if actual_port != base_port {
        log!("reload"; "port {} in use, using {} instead", base_port, actual_port);
    }
    debug!("reload"; "listening on port {}", actual_port);

    let clients = ReloadClients::new();
    let acceptor_clients = clients.clone();

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    debug!("reload"; "connection from {}", addr);
                    let clients = acceptor_clients.clone();
                    std::thread::spawn(move || {
                        handle_connection(stream, actual_port, &clients);
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if crate::core::is_shutdown() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    log!("reload"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(ReloadHandle {
        port: actual_port,
        clients,
    })
}

/// Sniff the request head without consuming it, then dispatch.
fn handle_connection(stream: TcpStream, port: u16, clients: &ReloadClients) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));

    let mut head = [0u8; 1024];
    let n = match stream.peek(&mut head) {
        Ok(n) if n > 0 => n,
        _ => return,
    };
    let head = String::from_utf8_lossy(&head[..n]).to_ascii_lowercase();

    if head.contains("sec-websocket-key") {
        // tungstenite re-reads the full upgrade request itself
        let _ = stream.set_read_timeout(None);
        clients.add_client(stream);
        return;
    }

    if head.starts_with("get /livereload.js") {
        let body = LIVERELOAD_JS.render(&LivereloadVars { lr_port: port });
        respond_http(stream, 200, "text/javascript; charset=utf-8", &body);
        return;
    }

    respond_http(stream, 404, "text/plain; charset=utf-8", "Not Found");
}

fn respond_http(mut stream: TcpStream, status: u16, content_type: &str, body: &str) {
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Try binding to port, retry with incremented port if in use.
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind livereload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
