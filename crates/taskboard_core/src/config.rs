//! Core configuration.
//!
//! # Responsibility
//! - Hold host-tunable knobs for storage naming and dashboard derivations.
//! - Parse host-supplied JSON with defaults for every absent field.
//!
//! # Invariants
//! - A `CoreConfig` returned by `from_json` or `default` passes `validate`.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "todos";
const DEFAULT_TREND_WINDOW_DAYS: u32 = 7;
const MAX_TREND_WINDOW_DAYS: u32 = 366;
const DEFAULT_RECENT_LIMIT: usize = 5;
const DEFAULT_UPCOMING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Key of the persisted task record.
    pub storage_key: String,
    /// Days covered by the completion trend, ending today.
    pub trend_window_days: u32,
    /// Rows in "recently updated" lists.
    pub recent_limit: usize,
    /// Rows in the upcoming deadline list.
    pub upcoming_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
            recent_limit: DEFAULT_RECENT_LIMIT,
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config object.
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed JSON or unknown fields.
    /// - Any `validate` error.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.trend_window_days == 0 || self.trend_window_days > MAX_TREND_WINDOW_DAYS {
            return Err(ConfigError::TrendWindowOutOfRange(self.trend_window_days));
        }
        if self.recent_limit == 0 {
            return Err(ConfigError::ZeroLimit("recent_limit"));
        }
        if self.upcoming_limit == 0 {
            return Err(ConfigError::ZeroLimit("upcoming_limit"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    EmptyStorageKey,
    TrendWindowOutOfRange(u32),
    ZeroLimit(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid config: {message}"),
            Self::EmptyStorageKey => write!(f, "storage_key cannot be empty"),
            Self::TrendWindowOutOfRange(days) => write!(
                f,
                "trend_window_days must be within 1..={MAX_TREND_WINDOW_DAYS}, got {days}"
            ),
            Self::ZeroLimit(field) => write!(f, "{field} must be at least 1"),
        }
    }
}

impl Error for ConfigError {}
