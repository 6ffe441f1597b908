//! Offline replay of a captured access log.
//!
//! Runs the parser and detectors over a complete file from the start,
//! without the maintenance gate, cooldowns or delivery. Used to tune the
//! window size and threshold against real traffic.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Serialize;

use crate::alerting::types::AlertCandidate;
use crate::analysis::Analyzer;
use crate::config::DetectionConfig;
use crate::ingest::parser::{parse_line, ParseError};

/// Summary of a replay run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub lines: u64,
    pub records: u64,
    pub parse_failures: u64,
    /// Candidate counts keyed by alert type.
    pub candidates: BTreeMap<String, u64>,
    pub final_error_rate: f64,
    pub final_pool: Option<String>,
    pub primary_pool: Option<String>,
}

/// Replay `reader` line by line, calling `on_candidate` for each candidate
/// in log order.
pub fn replay<R, F>(reader: R, config: &DetectionConfig, mut on_candidate: F) -> std::io::Result<ReplayReport>
where
    R: BufRead,
    F: FnMut(&AlertCandidate),
{
    let mut analyzer = Analyzer::new(config);
    let mut report = ReplayReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        report.lines += 1;

        let record = match parse_line(&line) {
            Ok(record) => record,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                report.parse_failures += 1;
                tracing::debug!(line = index + 1, error = %e, "Skipping unparsable log line");
                continue;
            }
        };
        report.records += 1;

        for candidate in analyzer.observe(&record) {
            *report
                .candidates
                .entry(candidate.kind().as_str().to_string())
                .or_default() += 1;
            on_candidate(&candidate);
        }
    }

    report.final_error_rate = analyzer.window().fraction();
    report.final_pool = analyzer.pools().current().map(str::to_string);
    report.primary_pool = analyzer.pools().primary().map(str::to_string);
    Ok(report)
}
