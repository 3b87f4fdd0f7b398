//! # dtc-client
//!
//! Rust client for the Data Toolchain (DTC) document-processing API:
//! create parsing pipelines and one-shot tasks, submit documents through
//! the webhook endpoint, and get back extracted text, metadata, and
//! processing statistics.
//!
//! The heavy lifting — parsing, OCR, classification — happens on the
//! remote service. What this crate adds on top of plain HTTP calls is the
//! **submission workflow**: size-aware timeouts, bounded retry with
//! progressive backoff, and a strict split between failures worth
//! retrying and failures that are not.
//!
//! ## Submission Flow
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Task      PUT /task with a webhook-source parsing graph
//!  ├─ 2. Warmup    short pause while the webhook source comes up
//!  ├─ 3. Submit    PUT /webhook, raw bytes + detected content type
//!  │               ↻ retry on network/timeout/5xx — 3 attempts,
//!  │                 backoff 5s/8s/…, timeout 60–120s by file size
//!  └─ 4. Extract   envelope → ProcessingResult { text, metadata, stats }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dtc_client::{ClientConfig, DtcClient, SubmitOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dtc_client::DtcError> {
//!     // Reads DTC_API_KEY (and optionally DTC_BASE_URL) once.
//!     let client = DtcClient::new(ClientConfig::from_env()?)?;
//!
//!     let result = client
//!         .process_document("report.docx", &SubmitOptions::new())
//!         .await?;
//!
//!     println!("{}", result.extracted_text);
//!     eprintln!(
//!         "objects: {}/{}",
//!         result.stats.objects_completed, result.stats.objects_requested
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `dtc` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! dtc-client = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handle;
pub mod output;
pub mod submit;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::DtcClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use envelope::{Envelope, ResponseStatus};
pub use error::DtcError;
pub use handle::{Handle, PipelineHandle, PipelineSpec, ServiceInfo, TaskHandle, TaskInfo, TaskStatus};
pub use output::{ProcessingResult, ProcessingStats};
pub use submit::{SubmissionRequest, SubmitOptions};
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport};
