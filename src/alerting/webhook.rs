//! Webhook delivery with bounded retry.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::alerting::types::AlertPayload;
use crate::config::WebhookConfig;
use crate::resilience::backoff::Backoff;
use crate::resilience::retries::{is_retryable_error, is_retryable_status};

/// Response bodies longer than this are cut in diagnostics.
const MAX_BODY_IN_ERROR: usize = 256;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook url is not configured")]
    NoEndpoint,

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("endpoint returned {status} after {attempts} attempt(s): {body}")]
    Status {
        attempts: u32,
        status: StatusCode,
        body: String,
    },
}

/// HTTP client bound to one webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
    max_attempts: u32,
    backoff: Backoff,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self, DeliveryError> {
        let url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(DeliveryError::NoEndpoint)?
            .to_string();

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("alert-watcher/", env!("CARGO_PKG_VERSION")));
        if config.bypass_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(DeliveryError::Client)?;

        Ok(Self {
            client,
            url,
            max_attempts: config.max_attempts.max(1),
            backoff: Backoff::new(config.base_delay_ms, config.max_delay_ms),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the payload, retrying transient failures.
    ///
    /// Returns the number of attempts used on success.
    pub async fn deliver(&self, payload: &AlertPayload) -> Result<u32, DeliveryError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let (error, retryable) = match self.client.post(&self.url).json(payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(alert_id = %payload.id, attempt = attempts, status = %response.status(), "Webhook accepted alert");
                    return Ok(attempts);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let error = DeliveryError::Status {
                        attempts,
                        status,
                        body: truncate(body.trim()),
                    };
                    (error, is_retryable_status(status))
                }
                Err(source) => {
                    let retryable = is_retryable_error(&source);
                    (DeliveryError::Transport { attempts, source }, retryable)
                }
            };

            if retryable && attempts < self.max_attempts {
                let delay = self.backoff.delay(attempts);
                tracing::warn!(
                    alert_id = %payload.id,
                    attempt = attempts,
                    delay = ?delay,
                    error = %error,
                    "Webhook delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(error);
        }
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_BODY_IN_ERROR {
        return body.to_string();
    }
    let mut end = MAX_BODY_IN_ERROR;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
