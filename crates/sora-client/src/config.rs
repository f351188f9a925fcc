//! Client configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for [`SoraClient`](crate::SoraClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer credential
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout (submit and status calls)
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config with default endpoint and timeouts.
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ClientError::config("OPENAI_API_KEY is not set"));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(api_key)?.with_env_overrides()
    }

    /// Apply `SORA_BASE_URL` and the timeout variables on top of `self`.
    pub fn with_env_overrides(mut self) -> ClientResult<Self> {
        if let Ok(base_url) = std::env::var("SORA_BASE_URL") {
            if !base_url.trim().is_empty() {
                self = self.with_base_url(&base_url)?;
            }
        }

        self.request_timeout = Duration::from_secs(
            std::env::var("SORA_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        );
        self.connect_timeout = Duration::from_secs(
            std::env::var("SORA_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        );

        Ok(self)
    }

    /// Override the API root. Must be an absolute http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> ClientResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|e| ClientError::config(format!("invalid base URL {:?}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "base URL must be http or https: {}",
                base_url
            )));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }
}
