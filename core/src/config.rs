//! Client-wide and per-call configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Constructor input for `ApiClient`.
///
/// Deserializes from the camelCase shape `{ baseUrl, timeout, defaultHeaders }`
/// so it can live in a JSON settings file next to other front-end config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiClientConfig {
    pub base_url: Option<String>,
    #[serde(rename = "timeout")]
    pub timeout_ms: Option<u64>,
    pub default_headers: BTreeMap<String, String>,
}

impl ApiClientConfig {
    /// Read `API_BASE_URL` and `API_TIMEOUT_MS` from the environment.
    pub fn from_env() -> Self {
        let base_url = std::env::var("API_BASE_URL").ok();
        let timeout_ms = std::env::var("API_TIMEOUT_MS")
            .ok()
            .and_then(|raw| match raw.parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "ignoring invalid API_TIMEOUT_MS");
                    None
                }
            });
        Self {
            base_url,
            timeout_ms,
            default_headers: BTreeMap::new(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Configured timeout, with zero or absent falling back to
    /// [`DEFAULT_TIMEOUT_MS`].
    pub(crate) fn effective_timeout(&self) -> Duration {
        Duration::from_millis(
            self.timeout_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        )
    }
}

/// Per-call overrides. Every field is optional and independent.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub timeout_ms: Option<u64>,
    /// Merged over the client's default headers; these win on collision.
    pub headers: BTreeMap<String, String>,
    pub with_credentials: bool,
    /// Replaces the client's base URL for this call only.
    pub base_url: Option<String>,
    /// Caller-owned cancellation. When present it replaces the internal
    /// timeout entirely.
    pub signal: Option<CancellationToken>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }
}
