//! Route handlers: thin dispatch around the core.
//!
//! Parse the body, run auth / rate limiting / validation, call the workflow
//! client, and map the classified result to an HTTP status. All error
//! responses reuse the `{"success":false,"error":{...}}` envelope.

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{http::HeaderMap, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Instant;

use flowgate_core::client::{WorkflowError, WorkflowResult};
use flowgate_core::ratelimit::RateLimitStatus;

use crate::auth::{self, AuthError};
use crate::server::AppState;
use crate::validation::EchoRequest;

/// `GET /api/health`: reports upstream reachability, never errors.
pub async fn health(State(state): State<AppState>) -> Response {
    let reachable = state.client.health_check().await;
    Json(json!({
        "status": "ok",
        "workflow_connection": if reachable { "connected" } else { "disconnected" },
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// `POST /api/workflow/echo`: validate, rate limit, forward to the echo
/// workflow.
pub async fn echo(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    match auth::check_api_key(&headers, &state.config.server.internal_api_key) {
        Err(AuthError::NotConfigured) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal API key not configured",
            );
        }
        Err(AuthError::InvalidKey) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "invalid or missing API key",
            );
        }
        Ok(()) => {}
    }

    let client_id = auth::client_ip(&headers, peer);
    let rate = state.limiter.check(
        &client_id,
        state.config.server.rate_limit,
        state.config.server.rate_limit_window(),
    );
    if !rate.allowed {
        let mut response =
            error_response(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT", "too many requests");
        let retry_after = retry_after_secs(&rate);
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(retry_after));
        apply_rate_limit_headers(&mut response, &rate);
        return response;
    }

    let request = match EchoRequest::parse(&body) {
        Ok(request) => request,
        Err(reason) => {
            return error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", &reason);
        }
    };

    let result = state.client.execute("echo", &request).await;
    let status = match &result {
        WorkflowResult::Success(_) => StatusCode::OK,
        WorkflowResult::Failure(error) => status_for_code(&error.code),
    };
    let mut response = (status, Json(result)).into_response();
    apply_rate_limit_headers(&mut response, &rate);
    response
}

/// Terminal-failure status mapping: validation 400, rate limited 429,
/// everything else 500. Unauthorized is handled before dispatch.
fn status_for_code(code: &str) -> StatusCode {
    match code {
        "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
        "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body: WorkflowResult = WorkflowResult::Failure(WorkflowError {
        code: code.to_string(),
        message: message.to_string(),
        details: None,
    });
    (status, Json(body)).into_response()
}

fn apply_rate_limit_headers(response: &mut Response, rate: &RateLimitStatus) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(rate.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(rate.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(retry_after_secs(rate)));
}

/// Seconds until the window resets, rounded up so clients never retry early.
fn retry_after_secs(rate: &RateLimitStatus) -> u64 {
    let remaining = rate.retry_after(Instant::now());
    let mut secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs += 1;
    }
    secs
}
