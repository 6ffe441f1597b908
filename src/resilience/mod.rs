//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Webhook delivery:
//!     → retries.rs (classify failure, decide whether to try again)
//!     → backoff.rs (exponential delay with jitter between attempts)
//!
//! Log file reopen:
//!     → backoff.rs (delay between reopen attempts while the file is missing)
//! ```
//!
//! # Design Decisions
//! - Every outbound call has a deadline and a bounded attempt count
//! - Only transient failures are retried
//! - Jittered backoff avoids synchronized retries across watchers

pub mod backoff;
pub mod retries;
