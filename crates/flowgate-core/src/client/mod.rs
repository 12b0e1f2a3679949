//! Outbound workflow client: classified errors, bounded retries.
//!
//! One call is a small state machine: send, and on failure classify the
//! error and consult [`RetryPolicy`]. Retries are an explicit loop with an
//! attempt counter; the backoff sleep suspends only the calling task, so
//! concurrent executions do not block each other. Callers never see raw
//! transport errors, only a [`WorkflowResult`].

mod result;

pub use result::{WorkflowError, WorkflowResult};

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::AppConfig;
use crate::retry::{classify, CallError, RetryDecision, RetryPolicy};

/// Fixed timeout for the health probe; deliberately short and not retried.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a workflow-automation webhook endpoint.
#[derive(Debug, Clone)]
pub struct WorkflowClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
    auto_retry: bool,
    error_logging: bool,
}

impl WorkflowClient {
    /// Build a client from validated configuration.
    pub fn new(cfg: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.workflow.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.workflow.webhook_url.trim_end_matches('/').to_string(),
            api_key: cfg.workflow.api_key.clone(),
            policy: RetryPolicy {
                max_retries: cfg.workflow.max_retries,
                base_delay: cfg.workflow.retry_delay(),
            },
            auto_retry: cfg.features.auto_retry,
            error_logging: cfg.features.error_logging,
        })
    }

    /// Execute a workflow by POSTing `payload` to `<base>/webhook/<endpoint>`.
    ///
    /// The payload is forwarded as-is; shape validation is the inbound
    /// layer's job. Transient failures are retried with exponential backoff
    /// up to the configured maximum, unless auto-retry is disabled.
    pub async fn execute<P>(&self, endpoint: &str, payload: &P) -> WorkflowResult
    where
        P: Serialize + ?Sized,
    {
        let url = format!("{}/webhook/{}", self.base_url, endpoint);
        let mut attempt: u32 = 0;
        loop {
            let raw = match self.send_once(&url, payload).await {
                Ok(data) => return WorkflowResult::Success(data),
                Err(raw) => raw,
            };

            let classified = classify(&raw);
            if self.error_logging {
                tracing::warn!(
                    endpoint,
                    attempt,
                    code = classified.kind.as_code(),
                    "workflow call failed: {}",
                    classified.message
                );
            }

            if self.auto_retry {
                if let RetryDecision::RetryAfter(delay) = self.policy.decide(classified.kind, attempt)
                {
                    if self.error_logging {
                        tracing::info!(
                            endpoint,
                            attempt = attempt + 1,
                            max_retries = self.policy.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "retrying workflow call"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
            }

            return WorkflowResult::Failure(classified.into_wire());
        }
    }

    /// One outbound attempt, mapped to a raw [`CallError`] on failure.
    async fn send_once<P>(&self, url: &str, payload: &P) -> Result<Value, CallError>
    where
        P: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Http {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        let body: Value = response.json().await?;

        // A well-formed body can still signal failure; classify the embedded
        // error object directly instead of inferring from the HTTP status.
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            if let Some(error) = body.get("error") {
                return Err(CallError::Remote(WorkflowError::from_body_value(error)));
            }
        }

        Ok(body)
    }

    /// Reachability probe: `GET <base>` with a short fixed timeout.
    /// No retry, no classification, never fails the caller.
    pub async fn health_check(&self) -> bool {
        match self
            .http
            .get(&self.base_url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                if self.error_logging {
                    tracing::warn!("workflow health check failed: {e}");
                }
                false
            }
        }
    }
}
