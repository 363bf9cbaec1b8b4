//! API client configuration.

use std::fmt;

use sage_common::ApiError;

/// Connection settings for the study-planner backend.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }

    /// Create config from the environment.
    ///
    /// Resolution order for the token:
    /// 1. `SAGE_API_TOKEN` env var
    /// 2. `token` field of `<config dir>/sage/credentials.json`
    ///    (written by the login flow)
    ///
    /// The base URL always comes from `SAGE_API_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var("SAGE_API_URL")
            .map_err(|_| ApiError::NotConfigured("SAGE_API_URL is not set".into()))?;

        if let Ok(token) = std::env::var("SAGE_API_TOKEN") {
            return Ok(Self::new(base_url, token));
        }

        if let Some(token) = Self::read_credentials() {
            return Ok(Self::new(base_url, token));
        }

        Err(ApiError::NotConfigured(
            "no API token. Set SAGE_API_TOKEN or sign in so \
             credentials.json is written."
                .into(),
        ))
    }

    /// Read the bearer token from the credentials file.
    fn read_credentials() -> Option<String> {
        let dir = dirs::config_dir()?;
        let path = dir.join("sage").join("credentials.json");
        let data = std::fs::read_to_string(&path).ok()?;
        let json: serde_json::Value = serde_json::from_str(&data).ok()?;
        json.get("token")?.as_str().map(|s| s.to_string())
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}
