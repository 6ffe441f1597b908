//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file ($ALERT_WATCHER_CONFIG, loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks, all errors collected)
//!     → WatcherConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the engine never reloads it
//! - All fields have defaults except the webhook URL
//! - A missing or invalid webhook URL is the only fatal startup error

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, ConfigError};
pub use schema::{
    AlertConfig, DetectionConfig, ObservabilityConfig, TailConfig, WatcherConfig, WebhookConfig,
};
