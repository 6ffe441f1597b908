//! Combined per-record analysis.

use crate::alerting::types::AlertCandidate;
use crate::analysis::pool_state::PoolTracker;
use crate::analysis::window::ErrorWindow;
use crate::config::DetectionConfig;
use crate::ingest::parser::LogRecord;
use crate::observability::metrics;

/// Feeds every record to both detectors, window first.
#[derive(Debug, Clone)]
pub struct Analyzer {
    window: ErrorWindow,
    pools: PoolTracker,
}

impl Analyzer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            window: ErrorWindow::new(config.window_size, config.error_threshold),
            pools: PoolTracker::new(config.primary_pool.as_deref()),
        }
    }

    /// At most one candidate from each detector.
    pub fn observe(&mut self, record: &LogRecord) -> Vec<AlertCandidate> {
        let mut candidates = Vec::with_capacity(2);
        candidates.extend(self.window.observe(record));
        candidates.extend(self.pools.observe(record));

        metrics::set_error_rate(self.window.fraction());
        metrics::set_window_fill(self.window.len());
        candidates
    }

    pub fn window(&self) -> &ErrorWindow {
        &self.window
    }

    pub fn pools(&self) -> &PoolTracker {
        &self.pools
    }
}
