//! Alert candidate and payload types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification types. Each has its own cooldown timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ErrorRate,
    Failover,
    Recovery,
    /// Operator-initiated delivery check; never produced by analysis.
    Test,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ErrorRate => "error_rate",
            AlertKind::Failover => "failover",
            AlertKind::Recovery => "recovery",
            AlertKind::Test => "test",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific facts carried by a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertDetails {
    ErrorRate {
        /// Error fraction in `[0, 1]`.
        fraction: f64,
        window_size: usize,
        pool: String,
        release: String,
        /// Upstream status of the record that tipped the window.
        upstream_status: String,
    },
    Failover {
        from_pool: String,
        to_pool: String,
        release: String,
    },
    Recovery {
        from_pool: String,
        to_pool: String,
        release: String,
    },
}

/// A possible notification, produced by analysis and consumed by the
/// dispatcher within the same processing cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCandidate {
    pub details: AlertDetails,
    /// Timestamp field of the log record that produced the candidate.
    pub log_timestamp: String,
    pub generated_at: SystemTime,
}

impl AlertCandidate {
    pub fn new(details: AlertDetails, log_timestamp: impl Into<String>) -> Self {
        Self {
            details,
            log_timestamp: log_timestamp.into(),
            generated_at: SystemTime::now(),
        }
    }

    pub fn kind(&self) -> AlertKind {
        match self.details {
            AlertDetails::ErrorRate { .. } => AlertKind::ErrorRate,
            AlertDetails::Failover { .. } => AlertKind::Failover,
            AlertDetails::Recovery { .. } => AlertKind::Recovery,
        }
    }

    /// Human-readable summary used as the notification text.
    pub fn message(&self) -> String {
        match &self.details {
            AlertDetails::ErrorRate { fraction, window_size, .. } => format!(
                "High upstream error rate detected: {:.2}% over last {} requests.",
                fraction * 100.0,
                window_size
            ),
            AlertDetails::Failover { from_pool, to_pool, release } => format!(
                "Failover detected: traffic moved from '{}' to '{}'. Release {} now serving.",
                from_pool,
                to_pool,
                release_or_unknown(release)
            ),
            AlertDetails::Recovery { from_pool, to_pool, release } => format!(
                "Traffic recovered to primary pool '{}' (was '{}'). Release {} now serving.",
                to_pool,
                from_pool,
                release_or_unknown(release)
            ),
        }
    }
}

fn release_or_unknown(release: &str) -> &str {
    if release.is_empty() {
        "unknown"
    } else {
        release
    }
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertPayload {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Slack-compatible rendering of `message`.
    pub text: String,
    pub message: String,
    /// Unix seconds at which the candidate was generated.
    pub timestamp: u64,
    pub release: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_pool: Option<String>,
}

impl AlertPayload {
    pub fn from_candidate(candidate: &AlertCandidate) -> Self {
        let message = candidate.message();
        let timestamp = candidate
            .generated_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut payload = Self {
            id: Uuid::new_v4(),
            kind: candidate.kind(),
            text: format!(":rotating_light: {}", message),
            message,
            timestamp,
            release: String::new(),
            log_timestamp: candidate.log_timestamp.clone(),
            error_rate_percent: None,
            window_size: None,
            pool: None,
            upstream_status: None,
            from_pool: None,
            to_pool: None,
        };

        match &candidate.details {
            AlertDetails::ErrorRate {
                fraction,
                window_size,
                pool,
                release,
                upstream_status,
            } => {
                payload.release = release_or_unknown(release).to_string();
                payload.error_rate_percent = Some((fraction * 10_000.0).round() / 100.0);
                payload.window_size = Some(*window_size);
                payload.pool = Some(pool.clone());
                if !upstream_status.is_empty() {
                    payload.upstream_status = Some(upstream_status.clone());
                }
            }
            AlertDetails::Failover { from_pool, to_pool, release }
            | AlertDetails::Recovery { from_pool, to_pool, release } => {
                payload.release = release_or_unknown(release).to_string();
                payload.from_pool = Some(from_pool.clone());
                payload.to_pool = Some(to_pool.clone());
            }
        }

        payload
    }

    /// Manual payload for end-to-end checks of the webhook.
    pub fn test_message(message: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            id: Uuid::new_v4(),
            kind: AlertKind::Test,
            text: format!(":white_check_mark: {}", message),
            message: message.to_string(),
            timestamp,
            release: "unknown".to_string(),
            log_timestamp: String::new(),
            error_rate_percent: None,
            window_size: None,
            pool: None,
            upstream_status: None,
            from_pool: None,
            to_pool: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rate_payload() {
        let candidate = AlertCandidate::new(
            AlertDetails::ErrorRate {
                fraction: 0.25,
                window_size: 4,
                pool: "blue".into(),
                release: "blue-v1".into(),
                upstream_status: "502, 502".into(),
            },
            "2026-10-16T10:00:00Z",
        );
        let payload = AlertPayload::from_candidate(&candidate);

        assert_eq!(payload.kind, AlertKind::ErrorRate);
        assert_eq!(payload.message, "High upstream error rate detected: 25.00% over last 4 requests.");
        assert_eq!(payload.text, format!(":rotating_light: {}", payload.message));
        assert_eq!(payload.error_rate_percent, Some(25.0));
        assert_eq!(payload.window_size, Some(4));
        assert!(payload.from_pool.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "error_rate");
        assert_eq!(json["upstream_status"], "502, 502");
        assert!(json.get("to_pool").is_none());
    }

    #[test]
    fn test_transition_messages() {
        let failover = AlertCandidate::new(
            AlertDetails::Failover {
                from_pool: "blue".into(),
                to_pool: "green".into(),
                release: String::new(),
            },
            "",
        );
        assert_eq!(
            failover.message(),
            "Failover detected: traffic moved from 'blue' to 'green'. Release unknown now serving."
        );

        let recovery = AlertCandidate::new(
            AlertDetails::Recovery {
                from_pool: "green".into(),
                to_pool: "blue".into(),
                release: "blue-v3".into(),
            },
            "",
        );
        assert_eq!(recovery.kind(), AlertKind::Recovery);
        assert_eq!(
            recovery.message(),
            "Traffic recovered to primary pool 'blue' (was 'green'). Release blue-v3 now serving."
        );

        let json = serde_json::to_value(AlertPayload::from_candidate(&recovery)).unwrap();
        assert_eq!(json["type"], "recovery");
        assert_eq!(json["from_pool"], "green");
        assert_eq!(json["to_pool"], "blue");
        assert_eq!(json["release"], "blue-v3");
        assert!(json.get("log_timestamp").is_none());
    }
}
