//! Stream analysis subsystem.
//!
//! # Data Flow
//! ```text
//! LogRecord
//!     → window.rs (rolling error fraction → error_rate candidate)
//!     → pool_state.rs (serving pool transitions → failover/recovery candidate)
//!     → analyzer.rs (collects both, in that order)
//! ```
//!
//! # Design Decisions
//! - Both detectors see every parsed record and are independent
//! - State is owned by the processing loop; no locking, no globals
//! - Only the final response status classifies a record; the upstream
//!   status is carried for payload diagnostics

pub mod analyzer;
pub mod pool_state;
pub mod window;

pub use analyzer::Analyzer;
pub use pool_state::PoolTracker;
pub use window::ErrorWindow;
