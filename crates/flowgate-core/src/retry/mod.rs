//! Retry and backoff policy for outbound workflow calls.
//!
//! This module encapsulates error classification (network failures,
//! timeouts, upstream throttling) and exponential backoff decisions so the
//! workflow client and any future outbound path share a consistent policy.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_message, classify_remote, classify_transport, ClassifiedError};
pub use error::CallError;
pub use policy::{retry_delay, ErrorKind, RetryDecision, RetryPolicy};
