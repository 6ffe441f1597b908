//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → metrics exporter → engine → tailer → processing loop
//!
//! Shutdown (shutdown.rs):
//!     Trigger → tailer stops yielding → in-flight record finishes → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Configuration errors abort before the loop starts
//! - Cancellation is cooperative; undelivered alerts are not retried on exit

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
