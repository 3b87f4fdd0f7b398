//! HTTP transport: the seam between the client logic and the wire.
//!
//! Everything above this module works in terms of the [`Transport`] trait
//! and plain [`ApiRequest`] / [`RawResponse`] values; only [`HttpTransport`]
//! knows about reqwest. That keeps orchestration and envelope parsing
//! testable with a scripted in-memory transport and means swapping the HTTP
//! stack touches exactly one file.
//!
//! The transport owns the credential. Two header forms exist because the
//! service expects them differently per endpoint:
//!
//! * regular endpoints — `Authorization: Bearer <key>`
//! * `/webhook` file submission — `Authorization: <key>` plus an `apikey`
//!   query parameter ([`ApiRequest::raw_auth`])

use crate::config::ClientConfig;
use crate::error::DtcError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Request body variants used by the service endpoints.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Raw payload bytes with their declared content type (file submission).
    Bytes {
        content_type: String,
        payload: Vec<u8>,
    },
}

/// A transport-agnostic description of one API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path starting with `/`, e.g. `/task`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Per-request timeout; falls back to the configured default.
    pub timeout: Option<Duration>,
    /// Use the bare-key authorization form (webhook submission).
    pub raw_auth: bool,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            raw_auth: false,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn bytes(mut self, content_type: impl Into<String>, payload: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes {
            content_type: content_type.into(),
            payload,
        };
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn raw_auth(mut self) -> Self {
        self.raw_auth = true;
        self
    }
}

/// Status code and body of a completed HTTP exchange, before envelope
/// parsing.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Capability to execute one API call.
///
/// Implementations must be safe for concurrent use; the client shares one
/// transport across all concurrent submissions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request, returning the raw response.
    ///
    /// Connection-level failures surface as [`DtcError::Network`], expired
    /// per-request timeouts as [`DtcError::Timeout`]. HTTP error statuses
    /// are NOT errors at this layer — envelope parsing classifies them.
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, DtcError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, DtcError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DtcError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            default_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, DtcError> {
        let url = format!("{}{}", self.base_url, request.path);
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        }
        .timeout(timeout);

        builder = if request.raw_auth {
            builder
                .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
                .query(&[("apikey", self.api_key.as_str())])
        } else {
            builder.bearer_auth(&self.api_key)
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Bytes {
                content_type,
                payload,
            } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(payload),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                DtcError::Timeout {
                    secs: timeout.as_secs(),
                }
            } else {
                DtcError::Network {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DtcError::Network {
                message: format!("failed to read response body: {e}"),
            })?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}

// ── Test double ──────────────────────────────────────────────────────────
