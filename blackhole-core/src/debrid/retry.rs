//! Bounded retry around a single HTTP request

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting. Used for probes and in tests.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Runs `send` until it yields a successful response or attempts run out.
///
/// Transport errors, 429 and 5xx responses are retried. Any other non-success
/// status ends the loop immediately. Returns `None` when no successful
/// response was obtained; callers treat that uniformly as a failed operation.
pub async fn retry_request<F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    mut send: F,
) -> Option<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match send().await {
            Ok(response) if response.status().is_success() => return Some(response),
            Ok(response) if is_retryable(response.status()) => {
                tracing::warn!(
                    endpoint,
                    attempt,
                    status = %response.status(),
                    "Retryable response from debrid service"
                );
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(endpoint, %status, body = %body, "Debrid service rejected request");
                return None;
            }
            Err(e) => {
                tracing::warn!(endpoint, attempt, "Request failed: {}", e);
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    tracing::error!(endpoint, max_attempts, "Giving up after retries");
    None
}
