//! Per-client record and check outcome types.

use std::time::{Duration, Instant};

/// Counter state for one client id within the current window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRecord {
    /// Requests seen in the current window.
    pub count: u32,
    /// When the current window ends; the record is stale past this point.
    pub reset_at: Instant,
}

impl RateLimitRecord {
    pub(super) fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    /// Whether this record's window has already ended.
    pub fn expired(&self, now: Instant) -> bool {
        now > self.reset_at
    }
}

/// Outcome of a rate-limit check, handed to the inbound route layer.
///
/// The route layer maps `allowed == false` to a 429 response and computes
/// its `Retry-After` from [`RateLimitStatus::retry_after`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitStatus {
    /// Time until the window resets, measured from `now`.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }
}
