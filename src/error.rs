//! Error types for the dtc-client library.
//!
//! The taxonomy splits along one line that drives all control flow in
//! [`crate::submit`]: **retryable** versus **terminal**.
//!
//! * Retryable — [`DtcError::Network`] and [`DtcError::Timeout`]. The remote
//!   end may simply have been busy; re-issuing the identical request can
//!   succeed. Only the submission orchestrator recovers from these, and only
//!   up to its attempt bound.
//!
//! * Terminal — everything else. A bad credential, a rejected payload, or an
//!   unreadable local file will not improve on a second try, so these
//!   propagate to the caller on first occurrence.
//!
//! [`DtcError::is_retryable`] is the single source of truth for the split;
//! the orchestrator never matches on individual variants.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the dtc-client library.
#[derive(Debug, Error)]
pub enum DtcError {
    // ── Local input errors ────────────────────────────────────────────────
    /// The file to submit could not be read. Raised before any network call.
    #[error("Cannot read file '{path}': {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Terminal remote errors ────────────────────────────────────────────
    /// The service rejected the credential (HTTP 401). Never retried.
    #[error("Authentication failed: {message}\nCheck the API key passed to ClientConfig (or the DTC_API_KEY environment variable).")]
    Authentication { message: String },

    /// The service rejected the request payload (HTTP 422). Never retried —
    /// the input must change before a resubmission can succeed.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The service answered with an application-level error: a non-2xx status
    /// outside the dedicated classes, or a 2xx whose envelope carries
    /// `status: "Error"`.
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api {
        message: String,
        status: Option<u16>,
    },

    /// A pipeline operation failed (e.g. creation returned no token).
    #[error("Pipeline operation failed: {message}")]
    Pipeline { message: String },

    /// A task operation failed (e.g. the task ended in a failed state).
    #[error("Task operation failed: {message}")]
    Task { message: String },

    // ── Retryable remote errors ───────────────────────────────────────────
    /// Connection-level failure or an HTTP 5xx from the service.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request did not complete within the per-attempt timeout.
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── Aggregate ─────────────────────────────────────────────────────────
    /// Every attempt of a submission failed with a retryable error. Wraps the
    /// last underlying cause and reports how many attempts were made.
    #[error("Submission failed after {attempts} attempt(s): {last}")]
    SubmissionFailed {
        attempts: u32,
        #[source]
        last: Box<DtcError>,
    },

    /// The caller-supplied deadline expired before the first attempt could
    /// be issued.
    #[error("Deadline expired before any submission attempt was made")]
    DeadlineExceeded,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DtcError {
    /// Whether re-issuing the identical request may succeed.
    ///
    /// Exactly the network/timeout class. Authentication, validation, and
    /// application errors are terminal; so is the aggregate itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DtcError::Network { .. } | DtcError::Timeout { .. })
    }
}
