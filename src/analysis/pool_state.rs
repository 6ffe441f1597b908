//! Serving-pool state machine.
//!
//! # States
//! - Unknown: no successful record seen yet
//! - Pool(p): the pool that served the last successful record
//!
//! # State Transitions
//! ```text
//! Unknown → P: first successful record, no alert
//! P → Q (Q != P, Q != primary): failover candidate
//! P → Q (Q != P, Q == primary): recovery candidate
//! P → P: nothing
//! ```
//!
//! Error responses (status >= 500) never move the state: a failing pool
//! still logs its own identity while the proxy fails over.

use crate::alerting::types::{AlertCandidate, AlertDetails};
use crate::config::schema::normalize_pool;
use crate::ingest::parser::LogRecord;

#[derive(Debug, Clone)]
pub struct PoolTracker {
    current: Option<String>,
    primary: Option<String>,
}

impl PoolTracker {
    /// `primary` is normalized; `None` infers it from the first successful record.
    pub fn new(primary: Option<&str>) -> Self {
        Self {
            current: None,
            primary: primary.map(normalize_pool).filter(|p| !p.is_empty()),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn observe(&mut self, record: &LogRecord) -> Option<AlertCandidate> {
        if record.is_error() {
            return None;
        }

        let pool = record.pool.as_str();
        let previous = match self.current.as_deref() {
            None => {
                tracing::info!(pool, release = %record.release, "Initial pool observed");
                if self.primary.is_none() {
                    tracing::info!(pool, "No primary pool configured; using first observed pool");
                    self.primary = Some(pool.to_string());
                }
                self.current = Some(pool.to_string());
                return None;
            }
            Some(current) if current == pool => return None,
            Some(current) => current.to_string(),
        };

        let details = if self.primary.as_deref() == Some(pool) {
            AlertDetails::Recovery {
                from_pool: previous,
                to_pool: pool.to_string(),
                release: record.release.clone(),
            }
        } else {
            AlertDetails::Failover {
                from_pool: previous,
                to_pool: pool.to_string(),
                release: record.release.clone(),
            }
        };

        self.current = Some(pool.to_string());
        Some(AlertCandidate::new(details, record.timestamp.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::types::AlertKind;
    use crate::ingest::parser::parse_line;

    fn record(status: u16, pool: &str) -> LogRecord {
        parse_line(&format!(
            r#"{{"status":{},"pool":"{}","release":"{}-v1"}}"#,
            status, pool, pool
        ))
        .unwrap()
    }

    fn kinds(tracker: &mut PoolTracker, seq: &[(u16, &str)]) -> Vec<Option<AlertKind>> {
        seq.iter()
            .map(|(status, pool)| tracker.observe(&record(*status, pool)).map(|c| c.kind()))
            .collect()
    }

    #[test]
    fn test_failover_and_recovery() {
        let mut tracker = PoolTracker::new(Some("blue"));
        let seen = kinds(
            &mut tracker,
            &[(200, "blue"), (200, "green"), (200, "green"), (200, "blue")],
        );
        assert_eq!(
            seen,
            vec![None, Some(AlertKind::Failover), None, Some(AlertKind::Recovery)]
        );
        assert_eq!(tracker.current(), Some("blue"));
    }

    #[test]
    fn test_failover_details() {
        let mut tracker = PoolTracker::new(Some("blue"));
        tracker.observe(&record(200, "blue"));
        let candidate = tracker.observe(&record(200, "green")).unwrap();
        assert_eq!(
            candidate.details,
            AlertDetails::Failover {
                from_pool: "blue".into(),
                to_pool: "green".into(),
                release: "green-v1".into(),
            }
        );
    }

    #[test]
    fn test_first_pool_never_alerts() {
        let mut tracker = PoolTracker::new(Some("blue"));
        assert!(tracker.observe(&record(200, "green")).is_none());
        assert_eq!(tracker.current(), Some("green"));
        // Moving to the primary from a known pool is a recovery.
        assert_eq!(
            tracker.observe(&record(200, "blue")).map(|c| c.kind()),
            Some(AlertKind::Recovery)
        );
    }

    #[test]
    fn test_errors_do_not_move_state() {
        let mut tracker = PoolTracker::new(Some("blue"));
        let seen = kinds(
            &mut tracker,
            &[(200, "blue"), (502, "green"), (503, "green"), (200, "blue")],
        );
        assert_eq!(seen, vec![None, None, None, None]);
        assert_eq!(tracker.current(), Some("blue"));

        // An error as the very first record leaves the state unknown.
        let mut fresh = PoolTracker::new(None);
        assert!(fresh.observe(&record(500, "green")).is_none());
        assert_eq!(fresh.current(), None);
        assert_eq!(fresh.primary(), None);
    }

    #[test]
    fn test_infers_primary_from_first_pool() {
        let mut tracker = PoolTracker::new(None);
        let seen = kinds(&mut tracker, &[(200, "blue"), (200, "green"), (200, "blue")]);
        assert_eq!(tracker.primary(), Some("blue"));
        assert_eq!(seen, vec![None, Some(AlertKind::Failover), Some(AlertKind::Recovery)]);
    }

    #[test]
    fn test_configured_primary_is_normalized() {
        let tracker = PoolTracker::new(Some("  BLUE "));
        assert_eq!(tracker.primary(), Some("blue"));
    }

    #[test]
    fn test_failover_between_backups() {
        let mut tracker = PoolTracker::new(Some("blue"));
        let seen = kinds(&mut tracker, &[(200, "green"), (200, "yellow")]);
        assert_eq!(seen, vec![None, Some(AlertKind::Failover)]);
    }
}
