//! Client configuration.
//!
//! All knobs live in one explicit [`ClientConfig`] value handed to the
//! client at construction. Nothing in the library reads the environment
//! after that point; [`ClientConfig::from_env`] exists as a convenience
//! that snapshots `DTC_API_KEY` / `DTC_BASE_URL` exactly once, so tests
//! and embedders can always construct a fully deterministic client.

use crate::error::DtcError;
use std::fmt;

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://eaas-dev.aparavi.com";

/// Configuration for a [`DtcClient`](crate::client::DtcClient).
///
/// Built via [`ClientConfig::builder`] or [`ClientConfig::from_env`].
///
/// # Example
/// ```rust
/// use dtc_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("sk-example")
///     .request_timeout_secs(15)
///     .max_attempts(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Credential attached to every request.
    pub api_key: String,

    /// Base URL of the service, without a trailing slash.
    pub base_url: String,

    /// Timeout for plain endpoint calls (task creation, status polls,
    /// pipeline management) in seconds. Default: 30.
    ///
    /// File submission ignores this: the orchestrator computes its own
    /// per-attempt timeout from the payload size (see [`crate::submit`]).
    pub request_timeout_secs: u64,

    /// Attempt bound for file submission. Default: 3.
    ///
    /// The bound is mandatory; without it a degraded service would be
    /// hammered indefinitely by every stuck caller. Per-call override via
    /// [`SubmitOptions::max_attempts`](crate::submit::SubmitOptions).
    pub max_attempts: u32,

    /// `User-Agent` header value. Default: `dtc-client/<crate version>`.
    pub user_agent: String,

    /// Pause between creating a webhook-source task and the first
    /// submission to it, in seconds. Default: 5.
    ///
    /// The webhook source is wired up asynchronously on the server; a
    /// submission racing the setup gets rejected. Zero is valid and used
    /// by the integration tests.
    pub task_warmup_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout_secs: 30,
            max_attempts: 3,
            user_agent: concat!("dtc-client/", env!("CARGO_PKG_VERSION")).to_owned(),
            task_warmup_secs: 5,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("user_agent", &self.user_agent)
            .field("task_warmup_secs", &self.task_warmup_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from the environment, read exactly once:
    /// `DTC_API_KEY` (required) and `DTC_BASE_URL` (optional).
    pub fn from_env() -> Result<Self, DtcError> {
        let mut builder = Self::builder();
        match std::env::var("DTC_API_KEY") {
            Ok(key) => builder = builder.api_key(key),
            Err(_) => {
                return Err(DtcError::Authentication {
                    message: "API key is required. Set DTC_API_KEY or pass one explicitly."
                        .to_owned(),
                })
            }
        }
        if let Ok(url) = std::env::var("DTC_BASE_URL") {
            if !url.is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the base URL; a trailing slash is stripped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn task_warmup_secs(mut self, secs: u64) -> Self {
        self.config.task_warmup_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DtcError> {
        let c = &self.config;
        if c.api_key.is_empty() {
            return Err(DtcError::Authentication {
                message: "API key is required. Set DTC_API_KEY or pass one explicitly.".to_owned(),
            });
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(DtcError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}
