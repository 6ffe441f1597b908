//! Access log record parsing.
//!
//! One JSON object per line. `status` and `pool` are required; every
//! other field is optional and defaults to empty. Unknown fields are kept
//! in [`LogRecord::extra`] and otherwise ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::normalize_pool;

/// Errors produced while turning a raw line into a [`LogRecord`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Whitespace-only line. Skipped without a diagnostic.
    #[error("empty line")]
    Empty,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("status '{0}' is not a valid HTTP status code")]
    InvalidStatus(String),

    #[error("field '{field}' has unexpected type {found}")]
    InvalidField {
        field: &'static str,
        found: &'static str,
    },
}

/// A single parsed access log entry. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: String,
    /// Final response status sent to the client.
    pub status: u16,
    /// Raw upstream status, e.g. `"502, 200"` after a retry.
    pub upstream_status: String,
    /// Lowercased, trimmed pool identifier.
    pub pool: String,
    pub release: String,
    pub extra: Map<String, Value>,
}

impl LogRecord {
    /// Classification used by the error window and pool state machine.
    pub fn is_error(&self) -> bool {
        self.status >= 500
    }

    /// Individual upstream codes in attempt order. Diagnostic only.
    pub fn upstream_codes(&self) -> Vec<u16> {
        self.upstream_status
            .split(|c: char| c == ',' || c == ':' || c.is_whitespace())
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }
}

/// Fallback timestamp keys, in order of preference after `timestamp`.
/// Several may appear on one line; they stay in `extra` as written.
const TIMESTAMP_FALLBACKS: [&str; 3] = ["time", "time_iso8601", "@timestamp"];

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    upstream_status: Option<Value>,
    #[serde(default)]
    pool: Option<Value>,
    #[serde(default)]
    release: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Parse one raw line.
pub fn parse_line(line: &str) -> Result<LogRecord, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let raw: RawRecord = serde_json::from_str(line)?;

    let status = match raw.status {
        None | Some(Value::Null) => return Err(ParseError::MissingField("status")),
        Some(value) => parse_status(value)?,
    };

    let pool = match raw.pool {
        None | Some(Value::Null) => return Err(ParseError::MissingField("pool")),
        Some(Value::String(s)) => normalize_pool(&s),
        Some(other) => {
            return Err(ParseError::InvalidField {
                field: "pool",
                found: type_name(&other),
            })
        }
    };
    if pool.is_empty() {
        return Err(ParseError::MissingField("pool"));
    }

    let timestamp = match raw.timestamp {
        Some(value) if !value.is_null() => Some(value),
        _ => TIMESTAMP_FALLBACKS
            .iter()
            .filter_map(|key| raw.extra.get(*key))
            .find(|value| !value.is_null())
            .cloned(),
    };

    Ok(LogRecord {
        timestamp: text_or_empty(timestamp),
        status,
        upstream_status: text_or_empty(raw.upstream_status),
        pool,
        release: text_or_empty(raw.release).trim().to_string(),
        extra: raw.extra,
    })
}

fn parse_status(value: Value) -> Result<u16, ParseError> {
    let code = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match code {
        Some(code @ 100..=599) => Ok(code as u16),
        _ => Err(ParseError::InvalidStatus(match value {
            Value::String(s) => s,
            other => other.to_string(),
        })),
    }
}

fn text_or_empty(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| text_or_empty(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
