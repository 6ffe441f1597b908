//! Rolling error-rate window.
//!
//! # Invariants
//! - `outcomes.len() <= capacity`
//! - `error_count` equals the number of `true` entries in `outcomes`
//!
//! An `error_rate` candidate is produced only once the window has been
//! filled at least once, and only while the fraction is strictly above
//! the threshold. Repeats are rate-limited by the dispatcher's cooldown.

use std::collections::VecDeque;

use crate::alerting::types::{AlertCandidate, AlertDetails};
use crate::ingest::parser::LogRecord;

#[derive(Debug, Clone)]
pub struct ErrorWindow {
    capacity: usize,
    threshold: f64,
    outcomes: VecDeque<bool>,
    error_count: usize,
    total_seen: u64,
}

impl ErrorWindow {
    pub fn new(capacity: usize, threshold: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            threshold,
            outcomes: VecDeque::with_capacity(capacity),
            error_count: 0,
            total_seen: 0,
        }
    }

    /// Classify `record` and return a candidate if the window is over threshold.
    pub fn observe(&mut self, record: &LogRecord) -> Option<AlertCandidate> {
        self.push(record.is_error());

        if !self.is_full() {
            return None;
        }

        let fraction = self.fraction();
        if fraction <= self.threshold {
            return None;
        }

        Some(AlertCandidate::new(
            AlertDetails::ErrorRate {
                fraction,
                window_size: self.capacity,
                pool: record.pool.clone(),
                release: record.release.clone(),
                upstream_status: record.upstream_status.clone(),
            },
            record.timestamp.clone(),
        ))
    }

    /// Push one outcome, evicting the oldest when at capacity.
    pub fn push(&mut self, is_error: bool) {
        if self.outcomes.len() == self.capacity {
            if let Some(true) = self.outcomes.pop_front() {
                self.error_count -= 1;
            }
        }
        self.outcomes.push_back(is_error);
        if is_error {
            self.error_count += 1;
        }
        self.total_seen = self.total_seen.saturating_add(1);
    }

    /// Errors divided by `min(seen, capacity)`; zero before any record.
    pub fn fraction(&self) -> f64 {
        match self.seen() {
            0 => 0.0,
            seen => self.error_count as f64 / seen as f64,
        }
    }

    /// Records classified so far, capped at capacity.
    pub fn seen(&self) -> usize {
        self.total_seen.min(self.capacity as u64) as usize
    }

    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    pub fn is_full(&self) -> bool {
        self.total_seen >= self.capacity as u64
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
