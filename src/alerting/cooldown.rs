//! Per-type alert cooldown table.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::alerting::types::AlertKind;

/// Last event time per alert type, with a fixed quiet period after it.
///
/// The dispatcher keeps two: one written only after a successful delivery,
/// and one written only after a delivery that gave up.
#[derive(Debug, Clone)]
pub struct CooldownTable {
    cooldown: Duration,
    last_sent: HashMap<AlertKind, Instant>,
}

impl CooldownTable {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: HashMap::new(),
        }
    }

    /// Time left before `kind` may be delivered again, if any.
    pub fn remaining(&self, kind: AlertKind, now: Instant) -> Option<Duration> {
        let last = self.last_sent.get(&kind)?;
        let elapsed = now.saturating_duration_since(*last);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    pub fn mark_sent(&mut self, kind: AlertKind, now: Instant) {
        self.last_sent.insert(kind, now);
    }

    pub fn last_sent(&self, kind: AlertKind) -> Option<Instant> {
        self.last_sent.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_window() {
        let mut table = CooldownTable::new(Duration::from_secs(300));
        let t0 = Instant::now();

        assert!(table.remaining(AlertKind::Failover, t0).is_none());
        table.mark_sent(AlertKind::Failover, t0);

        let t10 = t0 + Duration::from_secs(10);
        assert_eq!(table.remaining(AlertKind::Failover, t10), Some(Duration::from_secs(290)));
        // Checking does not move the clock.
        assert_eq!(table.last_sent(AlertKind::Failover), Some(t0));

        assert!(table.remaining(AlertKind::Failover, t0 + Duration::from_secs(300)).is_none());
    }

    #[test]
    fn test_types_are_independent() {
        let mut table = CooldownTable::new(Duration::from_secs(300));
        let now = Instant::now();
        table.mark_sent(AlertKind::Failover, now);

        assert!(table.remaining(AlertKind::Recovery, now).is_none());
        assert!(table.remaining(AlertKind::ErrorRate, now).is_none());
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let mut table = CooldownTable::new(Duration::ZERO);
        let now = Instant::now();
        table.mark_sent(AlertKind::ErrorRate, now);
        assert!(table.remaining(AlertKind::ErrorRate, now).is_none());
    }
}
