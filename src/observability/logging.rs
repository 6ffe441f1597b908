//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default directive when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    format!("warn,alert_watcher={level},watcher_cli={level}")
}

/// Install the global subscriber. Logs go to stderr so `watcher-cli`
/// can keep stdout for its JSON output.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let (plain, json) = if config.json_logs {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already installed");
    }
}
