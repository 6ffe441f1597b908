//! Log ingestion subsystem.
//!
//! # Data Flow
//! ```text
//! access log file (appended by the proxy)
//!     → tailer.rs (new complete lines, rotation/truncation handled)
//!     → parser.rs (JSON line → LogRecord, malformed lines rejected)
//!     → analysis
//! ```
//!
//! # Design Decisions
//! - History before startup is never replayed
//! - Parse failures are diagnostics, never errors that stop the stream

pub mod parser;
pub mod tailer;

pub use parser::{parse_line, LogRecord, ParseError};
pub use tailer::Tailer;
