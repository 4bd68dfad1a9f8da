//! Hosting-platform API client.
//!
//! Consumes two remote endpoints: the app-metadata fetch at startup and the
//! simulator page upload used by remote sync. Credentials come from the
//! `YOKE_USER_ID` / `YOKE_SECRET_KEY` environment variables; credential
//! storage itself lives outside this tool.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::YokeError;
use crate::render::PageRole;
use crate::{config::ProgramConfig, debug};

/// User-Agent sent with every platform request.
const USER_AGENT: &str = concat!("yoke-cli/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Remote app metadata
// =============================================================================

/// Read-only snapshot of hosting-platform metadata, fetched once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteApp {
    pub app_id: String,
    pub name: Option<String>,
    pub require_ssl: bool,
    pub auth_config: Option<AuthConfig>,
    pub config_settings: Vec<ConfigSetting>,
    /// Public URL of the app; the simulator redirect target.
    pub url: Option<String>,
}

/// Authentication configuration of the remote app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub kind: String,
}

/// One environment setting of the remote app. Settings marked `serverOnly`
/// never reach the rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigSetting {
    pub key: String,
    pub value: String,
    pub server_only: bool,
}

impl Default for ConfigSetting {
    fn default() -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            server_only: false,
        }
    }
}

impl RemoteApp {
    /// Whether the app's auth mode mandates a login page.
    pub fn requires_login_page(&self) -> bool {
        self.auth_config
            .as_ref()
            .is_some_and(|auth| auth.kind != "none")
    }

    /// The settings that may be shared with the client, as a JSON map.
    pub fn client_env(&self) -> serde_json::Map<String, serde_json::Value> {
        self.config_settings
            .iter()
            .filter(|setting| !setting.server_only)
            .map(|setting| (setting.key.clone(), setting.value.clone().into()))
            .collect()
    }

    #[cfg(test)]
    pub fn with_auth(kind: &str) -> Self {
        Self {
            auth_config: Some(AuthConfig { kind: kind.into() }),
            ..Self::default()
        }
    }
}

// =============================================================================
// Simulator sink
// =============================================================================

/// Receiver of rendered pages in simulator mode. A trait so the watch loop
/// can be exercised in tests without a network.
pub trait SimulatorSink: Send + Sync {
    fn upload_page(&self, role: PageRole, html: &str) -> Result<(), YokeError>;
}

// =============================================================================
// API client
// =============================================================================

/// Blocking client for the platform API.
#[derive(Debug)]
pub struct ApiClient {
    base: String,
    app_id: String,
    http: reqwest::blocking::Client,
    credentials: Option<(String, String)>,
}

impl ApiClient {
    /// Build a client from the run configuration. Returns `None` when no app
    /// id is configured (purely local preview).
    pub fn from_config(config: &ProgramConfig) -> Result<Option<Self>, YokeError> {
        let Some(app_id) = config.app.app_id.clone() else {
            return Ok(None);
        };

        let api_url = config.app.api_url.clone().ok_or_else(|| {
            YokeError::InvalidConfig(
                "app.api_url must be configured when an app_id is set".into(),
            )
        })?;

        // Validate early so a typo fails at startup, not mid-request.
        Url::parse(&api_url)
            .map_err(|e| YokeError::InvalidConfig(format!("Invalid api_url '{api_url}': {e}")))?;

        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| YokeError::Api(e.to_string()))?;

        let credentials = match (std::env::var("YOKE_USER_ID"), std::env::var("YOKE_SECRET_KEY")) {
            (Ok(user), Ok(secret)) => Some((user, secret)),
            _ => None,
        };

        Ok(Some(Self {
            base: api_url.trim_end_matches('/').to_string(),
            app_id,
            http,
            credentials,
        }))
    }

    /// Fetch the app metadata snapshot: `GET /api/apps/{appId}`.
    pub fn fetch_app(&self) -> Result<RemoteApp, YokeError> {
        let url = format!("{}/api/apps/{}", self.base, self.app_id);
        debug!("api"; "GET {url}");

        let response = self
            .authorized(self.http.get(&url))
            .send()
            .map_err(|e| YokeError::Api(e.to_string()))?;

        match response.status().as_u16() {
            200..=202 => response
                .json::<RemoteApp>()
                .map_err(|e| YokeError::Api(format!("invalid app metadata: {e}"))),
            401 => Err(YokeError::Unauthorized),
            404 => Err(YokeError::AppNotFound(self.app_id.clone())),
            status => Err(YokeError::Api(format!("unexpected status {status} from {url}"))),
        }
    }

    fn authorized(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.credentials {
            Some((user, secret)) => request.basic_auth(user, Some(secret)),
            None => request,
        }
    }
}

impl SimulatorSink for ApiClient {
    /// Upload a rendered page: `POST /dev/{appId}/simulator`, one multipart
    /// form field named by the page role.
    fn upload_page(&self, role: PageRole, html: &str) -> Result<(), YokeError> {
        let url = format!("{}/dev/{}/simulator", self.base, self.app_id);
        debug!("api"; "POST {url} ({})", role.field_name());

        let form = reqwest::blocking::multipart::Form::new()
            .text(role.field_name(), html.to_string());

        let response = self
            .authorized(self.http.post(&url))
            .multipart(form)
            .send()
            .map_err(|e| YokeError::RemoteSync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(YokeError::RemoteSync(format!(
                "unexpected status {} from {url}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}
