//! Timeout and backoff policy for file submission.
//!
//! Both schedules are pure functions of attempt index (and payload size),
//! so every wait in a submission is deterministic and unit-testable.
//!
//! ## Timeout: size tier plus escalation
//!
//! Server-side processing time scales with payload size, so the base
//! timeout is tiered: under 1 MB → 60 s, under 10 MB → 90 s, otherwise
//! 120 s (decimal megabytes, matching the service's own accounting). Each
//! retry adds 30 s on top — if an attempt timed out, an identical timeout
//! would likely just time out again. The sequence is monotonically
//! non-decreasing by construction.
//!
//! ## Backoff: progressive linear
//!
//! A failed attempt *i* waits `5 + 3·i` seconds before the next one:
//! 5 s, 8 s, 11 s, … Linear growth is deliberate here rather than the
//! exponential schedule used for high-frequency API calls: submissions are
//! minutes-long operations and a handful of attempts, so the schedule only
//! needs to clear short outages, not tame a thundering herd.

use std::time::Duration;

/// Upper bound of the small-payload tier (exclusive), in bytes.
const TIER_SMALL_LIMIT: u64 = 1_000_000;
/// Upper bound of the medium-payload tier (exclusive), in bytes.
const TIER_MEDIUM_LIMIT: u64 = 10_000_000;

const TIER_SMALL_TIMEOUT: Duration = Duration::from_secs(60);
const TIER_MEDIUM_TIMEOUT: Duration = Duration::from_secs(90);
const TIER_LARGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Added to the base timeout per retry.
const ESCALATION_STEP: Duration = Duration::from_secs(30);

const BACKOFF_BASE_SECS: u64 = 5;
const BACKOFF_STEP_SECS: u64 = 3;

/// Base timeout for a payload of the given size.
pub fn base_timeout(size_bytes: u64) -> Duration {
    if size_bytes < TIER_SMALL_LIMIT {
        TIER_SMALL_TIMEOUT
    } else if size_bytes < TIER_MEDIUM_LIMIT {
        TIER_MEDIUM_TIMEOUT
    } else {
        TIER_LARGE_TIMEOUT
    }
}

/// Timeout for attempt `attempt` (0-indexed) of a payload of the given
/// size: the size-tier base plus 30 s per prior attempt.
pub fn attempt_timeout(size_bytes: u64, attempt: u32) -> Duration {
    base_timeout(size_bytes) + ESCALATION_STEP * attempt
}

/// Pause after a retryable failure on attempt `attempt` (0-indexed):
/// 5 s, 8 s, 11 s, …
pub fn backoff_after(attempt: u32) -> Duration {
    Duration::from_secs(BACKOFF_BASE_SECS + BACKOFF_STEP_SECS * u64::from(attempt))
}
