//! The submission-and-retry loop.
//!
//! [`submit_file`] delivers a local file's bytes to the `/webhook` endpoint
//! of a handle, tolerating transient failures, and returns the flattened
//! [`ProcessingResult`] or exactly one terminal error.
//!
//! ## Attempt loop
//!
//! Per attempt: read the file fresh, build a [`SubmissionRequest`], issue
//! the PUT with the attempt's timeout from [`super::policy`]. The outcome
//! branches three ways:
//!
//! * success — parse and return, no further attempts
//! * terminal failure (auth, validation, application error) — propagate
//!   immediately; retrying cannot change a credential or schema problem
//! * retryable failure (connection, timeout, 5xx) — back off progressively
//!   and try again, up to the attempt bound
//!
//! Exhaustion wraps the last retryable error in
//! [`DtcError::SubmissionFailed`] so the caller sees both the cause and
//! the attempt count. A caller-supplied deadline is honoured between
//! attempts: once it has passed, no new attempt starts.
//!
//! The loop keeps no state beyond the running attempt; per-attempt records
//! (index, timeout, outcome) surface through `tracing` and are discarded.

use crate::envelope::parse_response;
use crate::error::DtcError;
use crate::output::ProcessingResult;
use crate::submit::{content_type, policy};
use crate::transport::{ApiRequest, Transport};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Options for one submission call.
///
/// The defaults reproduce the standard flow: auto-detected content type,
/// size-tiered escalating timeouts, three attempts, no overall deadline.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Fixed per-attempt timeout. When set, the size-tier policy is
    /// bypassed and every attempt uses this value.
    pub timeout: Option<Duration>,

    /// Declared content type. When `None`, detected from the file
    /// extension.
    pub content_type: Option<String>,

    /// Attempt bound; `None` uses the client default. Clamped to ≥ 1.
    pub max_attempts: Option<u32>,

    /// Overall deadline across all attempts. No new attempt starts after
    /// it has passed; an attempt already in flight is still bounded by its
    /// own timeout.
    pub deadline: Option<Instant>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n.max(1));
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// One attempt's payload, built fresh per attempt.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub payload: Vec<u8>,
}

/// Submit a file to the webhook endpoint of the given handle token.
///
/// `default_attempts` is the client-level attempt bound, used when the
/// options don't override it.
///
/// # Errors
///
/// * [`DtcError::FileAccess`] — path missing or unreadable; raised before
///   any network call
/// * [`DtcError::Authentication`] / [`DtcError::Validation`] /
///   [`DtcError::Api`] — terminal service rejections, never retried
/// * [`DtcError::SubmissionFailed`] — all attempts failed retryably
/// * [`DtcError::DeadlineExceeded`] — deadline passed before any attempt
pub async fn submit_file(
    transport: &Arc<dyn Transport>,
    handle_token: &str,
    path: &Path,
    opts: &SubmitOptions,
    default_attempts: u32,
) -> Result<ProcessingResult, DtcError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| DtcError::FileAccess {
            path: path.to_path_buf(),
            source: e,
        })?;
    if !metadata.is_file() {
        return Err(DtcError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ),
        });
    }

    let size = metadata.len();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_owned());
    let declared_type = opts
        .content_type
        .clone()
        .unwrap_or_else(|| content_type::detect(path).to_owned());
    let max_attempts = opts.max_attempts.unwrap_or(default_attempts).max(1);

    info!(
        "Submitting '{}' ({} bytes, {}) to token {}",
        filename, size, declared_type, handle_token
    );

    let mut attempt: u32 = 0;
    let mut last_err: Option<DtcError> = None;
    loop {
        if let Some(deadline) = opts.deadline {
            if Instant::now() >= deadline {
                warn!(
                    "'{}': deadline passed after {} attempt(s), giving up",
                    filename, attempt
                );
                return Err(match last_err {
                    Some(last) => DtcError::SubmissionFailed {
                        attempts: attempt,
                        last: Box::new(last),
                    },
                    None => DtcError::DeadlineExceeded,
                });
            }
        }

        let timeout = opts
            .timeout
            .unwrap_or_else(|| policy::attempt_timeout(size, attempt));

        // Re-read per attempt: the cheapest way to guarantee the payload
        // matches the file at send time.
        let payload = tokio::fs::read(path).await.map_err(|e| DtcError::FileAccess {
            path: path.to_path_buf(),
            source: e,
        })?;
        let request = SubmissionRequest {
            filename: filename.clone(),
            content_type: declared_type.clone(),
            size: payload.len() as u64,
            payload,
        };

        debug!(
            "'{}': attempt {}/{} (timeout {}s)",
            request.filename,
            attempt + 1,
            max_attempts,
            timeout.as_secs()
        );

        match send_once(transport, handle_token, request, timeout).await {
            Ok(result) => {
                if attempt > 0 {
                    info!("'{}': succeeded on attempt {}", filename, attempt + 1);
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    "'{}': attempt {}/{} failed — {}",
                    filename,
                    attempt + 1,
                    max_attempts,
                    e
                );
                if attempt + 1 >= max_attempts {
                    return Err(DtcError::SubmissionFailed {
                        attempts: max_attempts,
                        last: Box::new(e),
                    });
                }
                let pause = policy::backoff_after(attempt);
                debug!("'{}': backing off {}s", filename, pause.as_secs());
                last_err = Some(e);
                sleep(pause).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Issue one webhook PUT and flatten the response.
async fn send_once(
    transport: &Arc<dyn Transport>,
    handle_token: &str,
    request: SubmissionRequest,
    timeout: Duration,
) -> Result<ProcessingResult, DtcError> {
    let api_request = ApiRequest::put("/webhook")
        .query("type", "cpu")
        .query("token", handle_token)
        .bytes(request.content_type, request.payload)
        .timeout(timeout)
        .raw_auth();

    let raw = transport.execute(api_request).await?;
    let envelope = parse_response(raw.status, &raw.body)?;
    Ok(ProcessingResult::from_data(&envelope.into_data()))
}
