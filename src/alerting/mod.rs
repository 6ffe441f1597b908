//! Alerting subsystem.
//!
//! # Data Flow
//! ```text
//! AlertCandidate (from analysis)
//!     → maintenance.rs (marker present? drop, cooldown untouched)
//!     → cooldown.rs (same type sent within cooldown? drop, timer untouched)
//!     → types.rs (candidate → JSON payload)
//!     → webhook.rs (POST with timeout, bounded retry + backoff)
//!     → cooldown.rs (timer set only on successful delivery)
//! ```
//!
//! # Design Decisions
//! - Suppression never consumes a cooldown; a new condition after
//!   maintenance ends alerts immediately
//! - Delivery failure is logged and counted, never propagated
//! - The retry budget is bounded so ingestion always resumes

pub mod cooldown;
pub mod dispatcher;
pub mod maintenance;
pub mod types;
pub mod webhook;

pub use cooldown::CooldownTable;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use maintenance::MaintenanceGate;
pub use types::{AlertCandidate, AlertDetails, AlertKind, AlertPayload};
pub use webhook::{DeliveryError, WebhookClient};
