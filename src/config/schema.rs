//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the watcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default access log followed by the tailer.
pub const DEFAULT_LOG_PATH: &str = "/var/log/nginx/app_access.log";

/// Default maintenance marker path.
pub const DEFAULT_MAINTENANCE_FLAG: &str = "/var/run/alert-watcher/maintenance";

/// Root configuration for the alert watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Notification endpoint and delivery budget.
    pub webhook: WebhookConfig,

    /// Log file tailing settings.
    pub tail: TailConfig,

    /// Error-rate and pool-transition detection.
    pub detection: DetectionConfig,

    /// Cooldown and maintenance suppression.
    pub alerts: AlertConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Webhook delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Destination URL. Required; startup fails without it.
    pub url: Option<String>,

    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,

    /// Total delivery attempts (first try included).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Ignore HTTP(S)_PROXY settings from the environment.
    pub bypass_proxy: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 5,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 4000,
            bypass_proxy: false,
        }
    }
}

impl WebhookConfig {
    /// Worst-case wall time a single dispatch can block the ingest loop.
    pub fn delivery_budget_ms(&self) -> u64 {
        let attempts = u64::from(self.max_attempts);
        let requests = attempts.saturating_mul(self.timeout_secs.saturating_mul(1000));
        // Backoff happens between attempts; include the 10% jitter ceiling.
        let backoff = attempts
            .saturating_sub(1)
            .saturating_mul(self.max_delay_ms.saturating_add(self.max_delay_ms / 10));
        requests.saturating_add(backoff)
    }
}

/// Log tailing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TailConfig {
    /// File the tailer follows.
    pub log_path: String,

    /// Sleep between polls when no new data is available.
    pub poll_interval_ms: u64,

    /// Upper bound for the reopen backoff while the file is missing.
    pub reopen_max_delay_ms: u64,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            log_path: DEFAULT_LOG_PATH.to_string(),
            poll_interval_ms: 200,
            reopen_max_delay_ms: 5000,
        }
    }
}

/// Detection thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Capacity of the rolling error window.
    pub window_size: usize,

    /// Error fraction above which `error_rate` fires (strictly greater).
    pub error_threshold: f64,

    /// Pool normally serving traffic. Inferred from the first
    /// successful record when unset.
    pub primary_pool: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_size: 200,
            error_threshold: 0.02,
            primary_pool: None,
        }
    }
}

/// Alert rate limiting and suppression.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum spacing between deliveries of the same alert type.
    pub cooldown_secs: u64,

    /// Marker path; while it exists nothing is delivered.
    pub maintenance_flag: String,

    /// After a delivery gives up, further candidates of the same type skip
    /// the webhook for this long. Zero disables the hold-off.
    pub failure_holdoff_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            maintenance_flag: DEFAULT_MAINTENANCE_FLAG.to_string(),
            failure_holdoff_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9102".to_string(),
        }
    }
}

/// Trim and lowercase a pool name the same way log records are normalized.
pub fn normalize_pool(raw: &str) -> String {
    raw.trim().to_lowercase()
}
