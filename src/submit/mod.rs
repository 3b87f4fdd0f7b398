//! File submission: the retry-orchestrated path to `/webhook`.
//!
//! Each submodule owns exactly one concern, so each is independently
//! testable and the policy numbers can change without touching the loop.
//!
//! ## Data Flow
//!
//! ```text
//! path ──▶ content_type ──▶ policy ──▶ orchestrator ──▶ ProcessingResult
//! (local)  (extension map)  (timeout/   (attempt loop,
//!                            backoff)    the only network I/O)
//! ```
//!
//! 1. [`content_type`] — map the file extension to a declared MIME type
//! 2. [`policy`] — size-tiered per-attempt timeouts and the progressive
//!    backoff schedule
//! 3. [`orchestrator`] — read the file, drive the attempts, classify
//!    failures, aggregate on exhaustion

pub mod content_type;
pub mod orchestrator;
pub mod policy;

pub use orchestrator::{SubmissionRequest, SubmitOptions};
