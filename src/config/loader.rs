//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{normalize_pool, WatcherConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "ALERT_WATCHER_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WatcherConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration from the process environment.
///
/// Precedence, lowest first: defaults, the TOML file named by
/// `ALERT_WATCHER_CONFIG`, then individual environment variables.
pub fn load_from_env() -> Result<WatcherConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Same as [`load_from_env`] with an injectable variable lookup.
pub fn load_with<F>(lookup: F) -> Result<WatcherConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = resolve_with(&lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Merge defaults, file and environment without validating.
///
/// Used by tools that only need part of the configuration.
pub fn resolve_with<F>(lookup: &F) -> Result<WatcherConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match non_empty(lookup(CONFIG_PATH_ENV)) {
        Some(path) => read_file(Path::new(&path))?,
        None => WatcherConfig::default(),
    };
    apply_env(&mut config, lookup)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<WatcherConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn apply_env<F>(config: &mut WatcherConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(lookup("SLACK_WEBHOOK_URL")).or_else(|| non_empty(lookup("ALERT_WEBHOOK_URL"))) {
        config.webhook.url = Some(url);
    }
    if let Some(path) = non_empty(lookup("LOG_PATH")) {
        config.tail.log_path = path;
    }
    if let Some(size) = parse_env(lookup, "ALERT_ERROR_WINDOW")? {
        config.detection.window_size = size;
    }
    if let Some(threshold) = parse_env(lookup, "ALERT_ERROR_THRESHOLD")? {
        config.detection.error_threshold = threshold;
    }
    if let Some(cooldown) = parse_env(lookup, "ALERT_COOLDOWN_SECONDS")? {
        config.alerts.cooldown_secs = cooldown;
    }
    if let Some(holdoff) = parse_env(lookup, "ALERT_FAILURE_HOLDOFF_SECONDS")? {
        config.alerts.failure_holdoff_secs = holdoff;
    }
    if let Some(pool) = non_empty(lookup("PRIMARY_POOL")) {
        config.detection.primary_pool = Some(pool);
    }
    if let Some(flag) = non_empty(lookup("MAINTENANCE_FLAG_FILE")) {
        config.alerts.maintenance_flag = flag;
    }
    if let Some(level) = non_empty(lookup("ALERT_WATCHER_LOG_LEVEL")) {
        config.observability.log_level = level;
    }

    config.detection.primary_pool = config
        .detection
        .primary_pool
        .as_deref()
        .map(normalize_pool)
        .filter(|pool| !pool.is_empty());

    Ok(())
}

fn parse_env<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup(var)) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
