use std::time::Duration;

/// High-level classification of an outbound failure for retry purposes.
///
/// Each kind has a stable wire code that appears in the `error.code` field of
/// a failed workflow result; downstream consumers match on those strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network-level failure (connection refused, DNS, reset).
    Network,
    /// The request timed out (connect or read).
    Timeout,
    /// The payload was rejected as malformed; retrying cannot help.
    Validation,
    /// The upstream asked us to slow down (HTTP 429).
    RateLimit,
    /// Any other workflow/business error (catch-all, not retried).
    Workflow,
}

impl ErrorKind {
    /// Stable wire code for the `error.code` field.
    pub fn as_code(self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Timeout => "NETWORK_TIMEOUT",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::Workflow => "WORKFLOW_ERROR",
        }
    }

    /// Parse a wire code back into a kind. Returns `None` for codes outside
    /// the taxonomy (e.g. route-level literals like `UNAUTHORIZED`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NETWORK_ERROR" => Some(ErrorKind::Network),
            "NETWORK_TIMEOUT" => Some(ErrorKind::Timeout),
            "VALIDATION_ERROR" => Some(ErrorKind::Validation),
            "RATE_LIMIT" => Some(ErrorKind::RateLimit),
            "WORKFLOW_ERROR" => Some(ErrorKind::Workflow),
            _ => None,
        }
    }

    /// Whether this kind of failure is considered transient.
    ///
    /// Network, timeout and rate-limit failures may succeed on a later
    /// attempt. Validation failures are deterministic and workflow errors
    /// are not assumed transient.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimit
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy for outbound workflow calls.
///
/// Attempts are 0-indexed: attempt 0 is the first call, and the delay before
/// re-issuing after attempt `n` is `base_delay * 2^n`. The policy imposes no
/// upper bound on a single delay; `max_retries` bounds total attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Decide whether to retry after a failure of `kind` on 0-based
    /// `attempt_index`, and if so for how long to back off first.
    pub fn decide(&self, kind: ErrorKind, attempt_index: u32) -> RetryDecision {
        if attempt_index >= self.max_retries {
            return RetryDecision::NoRetry;
        }
        if !kind.is_transient() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(retry_delay(attempt_index, self.base_delay))
    }
}

/// Backoff delay for a 0-based attempt index: `base * 2^attempt_index`.
/// Saturates instead of overflowing for absurdly high indices.
pub fn retry_delay(attempt_index: u32, base_delay: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
    base_delay.saturating_mul(factor)
}
