//! Configuration validation.
//!
//! Serde handles syntax; this module checks ranges and required values.
//! Every problem is reported, not just the first one.

use thiserror::Error;
use url::Url;

use crate::config::schema::WatcherConfig;

/// Upper bound on how long one dispatch may hold up log ingestion.
pub const MAX_DELIVERY_BUDGET_MS: u64 = 120_000;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("webhook url is required (set SLACK_WEBHOOK_URL)")]
    MissingWebhookUrl,

    #[error("webhook url '{url}' is invalid: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },

    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: u64,
        value: u64,
    },

    #[error("error_threshold must be within [0, 1), got {0}")]
    ThresholdOutOfRange(f64),

    #[error("delivery budget of {budget_ms} ms exceeds the {max_ms} ms cap")]
    DeliveryBudgetTooLarge { budget_ms: u64, max_ms: u64 },

    #[error("log_path must not be empty")]
    EmptyLogPath,
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &WatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.webhook.url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingWebhookUrl),
        Some(raw) => match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::InvalidWebhookUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidWebhookUrl {
                url: raw.to_string(),
                reason: e.to_string(),
            }),
        },
    }

    check_min(&mut errors, "window_size", config.detection.window_size as u64, 1);
    check_min(&mut errors, "max_attempts", u64::from(config.webhook.max_attempts), 1);
    check_min(&mut errors, "timeout_secs", config.webhook.timeout_secs, 1);
    check_min(&mut errors, "poll_interval_ms", config.tail.poll_interval_ms, 10);

    let threshold = config.detection.error_threshold;
    if !(0.0..1.0).contains(&threshold) {
        errors.push(ValidationError::ThresholdOutOfRange(threshold));
    }

    let budget_ms = config.webhook.delivery_budget_ms();
    if budget_ms > MAX_DELIVERY_BUDGET_MS {
        errors.push(ValidationError::DeliveryBudgetTooLarge {
            budget_ms,
            max_ms: MAX_DELIVERY_BUDGET_MS,
        });
    }

    if config.tail.log_path.trim().is_empty() {
        errors.push(ValidationError::EmptyLogPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_min(errors: &mut Vec<ValidationError>, field: &'static str, value: u64, min: u64) {
    if value < min {
        errors.push(ValidationError::TooSmall { field, min, value });
    }
}
