//! Alert watcher.
//!
//! Follows the reverse proxy's JSON access log and posts webhook alerts on
//! elevated upstream error rates and on failover/recovery between pools.
//!
//! ```text
//!  access log ──▶ ingest::tailer ──▶ ingest::parser ──┬──▶ analysis::window ─────┐
//!                                                     └──▶ analysis::pool_state ─┤
//!                                                                                ▼
//!  webhook ◀── alerting::webhook ◀── alerting::cooldown ◀── alerting::maintenance
//! ```

use alert_watcher::config::{load_from_env, ObservabilityConfig};
use alert_watcher::lifecycle::{startup, Shutdown};
use alert_watcher::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the config; fall back to defaults to report why it failed.
            logging::init(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    logging::init(&config.observability);

    tracing::info!("alert-watcher v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let stats = startup::run(config, shutdown).await?;

    tracing::info!(
        lines = stats.lines,
        records = stats.records,
        parse_failures = stats.parse_failures,
        delivered = stats.delivered,
        delivery_failures = stats.delivery_failures,
        "Shutdown complete"
    );
    Ok(())
}
