//! Live reload message protocol.
//!
//! JSON text frames between the notifier and browser clients:
//!
//! - `connected`: sent once after the subscription handshake
//! - `reload`: a watched file changed; `path` is the URL path it maps to
//!   (`/` for the entry page)

use serde::{Deserialize, Serialize};

/// Message sent to subscribed browser clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Subscription established.
    Connected { version: String },

    /// A watched file changed.
    Reload { path: String },
}

impl ReloadMessage {
    /// Create the post-handshake greeting.
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Create a reload notification scoped to a URL path.
    pub fn reload(path: impl Into<String>) -> Self {
        Self::Reload { path: path.into() }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_json_shape() {
        let json = ReloadMessage::reload("/styles/app.css").to_json();
        assert_eq!(json, r#"{"type":"reload","path":"/styles/app.css"}"#);
    }

    #[test]
    fn test_connected_json_shape() {
        let json = ReloadMessage::connected().to_json();
        assert!(json.starts_with(r#"{"type":"connected","version":"#));
    }

    #[test]
    fn test_round_trip() {
        let msg = ReloadMessage::reload("/");
        let parsed: ReloadMessage = serde_json::from_str(&msg.to_json()).unwrap();
        match parsed {
            ReloadMessage::Reload { path } => assert_eq!(path, "/"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
