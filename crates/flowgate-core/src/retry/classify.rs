//! Classify raw outbound failures into retry policy error kinds.
//!
//! The rules run in a fixed order and the first match wins. Several of them
//! sniff substrings of free-text messages; that scheme is inherited from the
//! upstream webhook contract (remote errors arrive as prose) and is kept
//! exactly as documented rather than tightened, so that remote-supplied
//! messages keep classifying the way existing consumers expect. Structured
//! transport predicates are consulted first within the same rule slots.

use serde_json::{json, Value};

use crate::client::WorkflowError;
use crate::retry::error::CallError;
use crate::retry::policy::ErrorKind;

/// A raw failure resolved to a kind, with diagnostics preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Opaque diagnostic payload: the original failure rendered as JSON.
    pub details: Option<Value>,
}

impl ClassifiedError {
    /// Flatten into the wire-form error envelope.
    pub fn into_wire(self) -> WorkflowError {
        WorkflowError {
            code: self.kind.as_code().to_string(),
            message: self.message,
            details: self.details,
        }
    }
}

/// Classify a raw outbound failure. Pure; no side effects.
pub fn classify(err: &CallError) -> ClassifiedError {
    match err {
        CallError::Remote(remote) => classify_remote(remote),
        CallError::Transport(e) => classify_transport(e),
        CallError::Http { status, .. } => {
            let message = err.to_string();
            let details = json!({ "source": message, "status": status });
            ClassifiedError {
                kind: classify_message(Some(*status), &message),
                message,
                details: Some(details),
            }
        }
    }
}

/// Classify an error object embedded in a `success: false` response body.
///
/// If its code is already one of ours, pass it through untouched so that
/// classification is idempotent (no double-wrapping). Otherwise fall back to
/// the message rules.
pub fn classify_remote(remote: &WorkflowError) -> ClassifiedError {
    if let Some(kind) = ErrorKind::from_code(&remote.code) {
        return ClassifiedError {
            kind,
            message: remote.message.clone(),
            details: remote.details.clone(),
        };
    }
    let details = json!({
        "source": { "code": remote.code, "message": remote.message },
        "remote_details": remote.details,
    });
    ClassifiedError {
        kind: classify_message(None, &remote.message),
        message: remote.message.clone(),
        details: Some(details),
    }
}

/// Classify a transport-level failure from the HTTP client.
pub fn classify_transport(e: &reqwest::Error) -> ClassifiedError {
    let message = e.to_string();
    let details = Some(json!({
        "source": message,
        "chain": source_chain(e),
    }));
    // Connect failures (refused, DNS, connect timeout) are network errors
    // and take precedence over the generic timeout check.
    let kind = if e.is_connect() {
        ErrorKind::Network
    } else if e.is_timeout() {
        ErrorKind::Timeout
    } else {
        classify_message(e.status().map(|s| s.as_u16()), &message)
    };
    ClassifiedError {
        kind,
        message,
        details,
    }
}

/// The documented substring fallback chain, in order, first match wins.
pub fn classify_message(status: Option<u16>, message: &str) -> ErrorKind {
    if message.contains("network") || message.contains("connection") {
        return ErrorKind::Network;
    }
    if message.contains("timeout") {
        return ErrorKind::Timeout;
    }
    if message.contains("validation")
        || message.contains("required")
        || message.contains("invalid")
    {
        return ErrorKind::Validation;
    }
    if status == Some(429) || message.contains("rate limit") {
        return ErrorKind::RateLimit;
    }
    ErrorKind::Workflow
}

/// Render the `std::error::Error` source chain for diagnostics.
fn source_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}
