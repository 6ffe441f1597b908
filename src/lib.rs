//! Alert watcher library: log tailing, error-rate and pool-transition
//! detection, and rate-limited webhook alerting for a blue/green proxy.

pub mod alerting;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod lifecycle;
pub mod observability;
pub mod replay;
pub mod resilience;

pub use config::WatcherConfig;
pub use engine::{Engine, EngineStats};
pub use lifecycle::Shutdown;
