//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stderr (human-readable or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Malformed lines, rotations and delivery failures are log events,
//!   never process errors
//! - Metrics macros are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
