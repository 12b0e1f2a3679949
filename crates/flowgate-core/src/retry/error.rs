//! Raw failure type for a single outbound webhook attempt.

use crate::client::WorkflowError;

/// Error produced by one outbound call before classification.
///
/// Kept separate from the public result envelope so the classifier and retry
/// policy can inspect the failure's shape (transport error, HTTP status,
/// remote-supplied error object) before it is flattened into a
/// `WorkflowError` for the caller.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The HTTP transport failed (connect, DNS, timeout, body decode).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// The upstream answered with a non-success HTTP status.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },
    /// The response body carried `success: false` with an embedded error.
    #[error("{}", .0.message)]
    Remote(WorkflowError),
}

impl CallError {
    /// HTTP status embedded in this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Transport(e) => e.status().map(|s| s.as_u16()),
            CallError::Http { status, .. } => Some(*status),
            CallError::Remote(_) => None,
        }
    }
}
