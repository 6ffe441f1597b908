//! The processing loop.
//!
//! One line at a time, strictly in log order: parse, analyze, then gate
//! and dispatch every candidate before the next line is pulled. All state
//! is owned here and threaded through each step.

use futures_util::{Stream, StreamExt};
use serde::Serialize;

use crate::alerting::dispatcher::{DispatchOutcome, Dispatcher};
use crate::alerting::webhook::DeliveryError;
use crate::analysis::Analyzer;
use crate::config::WatcherConfig;
use crate::ingest::parser::{parse_line, ParseError};
use crate::observability::metrics;

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub lines: u64,
    pub records: u64,
    pub parse_failures: u64,
    pub delivered: u64,
    pub suppressed_maintenance: u64,
    pub suppressed_cooldown: u64,
    pub suppressed_holdoff: u64,
    pub delivery_failures: u64,
}

pub struct Engine {
    analyzer: Analyzer,
    dispatcher: Dispatcher,
    stats: EngineStats,
}

impl Engine {
    pub fn new(config: &WatcherConfig) -> Result<Self, DeliveryError> {
        Ok(Self::from_parts(
            Analyzer::new(&config.detection),
            Dispatcher::new(&config.webhook, &config.alerts)?,
        ))
    }

    pub fn from_parts(analyzer: Analyzer, dispatcher: Dispatcher) -> Self {
        Self {
            analyzer,
            dispatcher,
            stats: EngineStats::default(),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Drain `lines` until the stream ends (shutdown).
    pub async fn run<S>(&mut self, lines: S) -> EngineStats
    where
        S: Stream<Item = String>,
    {
        tokio::pin!(lines);
        while let Some(line) = lines.next().await {
            self.process_line(&line).await;
        }
        tracing::info!(stats = ?self.stats, "Processing loop finished");
        self.stats.clone()
    }

    /// Handle one raw line end to end. Returns the outcome of every
    /// candidate it produced.
    pub async fn process_line(&mut self, line: &str) -> Vec<DispatchOutcome> {
        self.stats.lines += 1;
        metrics::record_line();

        let record = match parse_line(line) {
            Ok(record) => record,
            Err(ParseError::Empty) => return Vec::new(),
            Err(e) => {
                self.stats.parse_failures += 1;
                metrics::record_parse_failure(parse_failure_reason(&e));
                tracing::warn!(error = %e, line = %truncate_line(line), "Skipping unparsable log line");
                return Vec::new();
            }
        };
        self.stats.records += 1;

        let candidates = self.analyzer.observe(&record);
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let outcome = self.dispatcher.dispatch(candidate).await;
            match &outcome {
                DispatchOutcome::Delivered { .. } => self.stats.delivered += 1,
                DispatchOutcome::Maintenance => self.stats.suppressed_maintenance += 1,
                DispatchOutcome::CoolingDown { .. } => self.stats.suppressed_cooldown += 1,
                DispatchOutcome::HeldOff { .. } => self.stats.suppressed_holdoff += 1,
                DispatchOutcome::Failed(_) => self.stats.delivery_failures += 1,
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn parse_failure_reason(err: &ParseError) -> &'static str {
    match err {
        ParseError::Empty => "empty",
        ParseError::Json(_) => "json",
        ParseError::MissingField(_) => "missing_field",
        ParseError::InvalidStatus(_) => "invalid_status",
        ParseError::InvalidField { .. } => "invalid_field",
    }
}

fn truncate_line(line: &str) -> &str {
    const MAX: usize = 200;
    if line.len() <= MAX {
        return line;
    }
    let mut end = MAX;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
