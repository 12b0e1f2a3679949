//! Inbound payload schemas and validation.
//!
//! The workflow client forwards payloads without re-checking shape, so all
//! validation happens here at the edge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const MESSAGE_MAX_CHARS: usize = 1000;

/// Body for the echo workflow route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoRequest {
    pub message: String,
}

impl EchoRequest {
    /// Parse and validate a raw JSON body. Returns a human-readable reason
    /// on rejection, which the route layer wraps as a 400.
    pub fn parse(body: &Value) -> Result<Self, String> {
        let req: Self = serde_json::from_value(body.clone())
            .map_err(|e| format!("invalid request body: {e}"))?;
        if req.message.is_empty() {
            return Err("message cannot be empty".to_string());
        }
        if req.message.chars().count() > MESSAGE_MAX_CHARS {
            return Err(format!("message too long (max {MESSAGE_MAX_CHARS} characters)"));
        }
        Ok(req)
    }
}
