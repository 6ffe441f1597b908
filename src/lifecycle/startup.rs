//! Startup orchestration.
//!
//! Subsystems initialize in dependency order: metrics exporter, engine
//! (webhook client, detectors), then the tailer. Any error here is fatal;
//! once the loop runs nothing is.

use thiserror::Error;

use crate::alerting::webhook::DeliveryError;
use crate::config::WatcherConfig;
use crate::engine::{Engine, EngineStats};
use crate::ingest::tailer::Tailer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to initialize webhook client: {0}")]
    Webhook(#[from] DeliveryError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Run the watcher until `shutdown` is triggered.
pub async fn run(config: WatcherConfig, shutdown: Shutdown) -> Result<EngineStats, StartupError> {
    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let mut engine = Engine::new(&config)?;
    let tailer = Tailer::new(&config.tail, shutdown.subscribe());

    tracing::info!(
        log_path = %tailer.path().display(),
        window_size = config.detection.window_size,
        error_threshold = config.detection.error_threshold,
        cooldown_secs = config.alerts.cooldown_secs,
        failure_holdoff_secs = config.alerts.failure_holdoff_secs,
        primary_pool = config.detection.primary_pool.as_deref().unwrap_or("<inferred>"),
        maintenance_flag = %config.alerts.maintenance_flag,
        "Alert watcher started"
    );

    Ok(engine.run(tailer.into_stream()).await)
}
