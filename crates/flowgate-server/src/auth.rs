//! API-key auth and client identification for inbound requests.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Why an inbound request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No internal API key is configured; the deployment is broken, not the
    /// caller. Maps to 500, never 401.
    NotConfigured,
    /// The `x-api-key` header is missing or wrong.
    InvalidKey,
}

/// Validate the `x-api-key` header against the configured internal key.
pub fn check_api_key(headers: &HeaderMap, configured: &str) -> Result<(), AuthError> {
    if configured.is_empty() {
        return Err(AuthError::NotConfigured);
    }
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if presented == Some(configured) {
        Ok(())
    } else {
        Err(AuthError::InvalidKey)
    }
}

/// Extract the client identifier used for rate limiting.
///
/// Proxy headers win over the socket peer: first hop of `x-forwarded-for`,
/// then `x-real-ip`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    peer.ip().to_string()
}
