//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{process_env, var_opt_str, var_or_default, var_or_default_bool};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
    DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Controller-level configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// First delay after a failed reconciliation (seconds)
    pub backoff_min_secs: u64,
    /// Ceiling for the Fibonacci backoff (seconds)
    pub backoff_max_secs: u64,
    /// Limits how many objects are reconciled simultaneously (0 = unbounded)
    pub max_concurrent_reconciliations: u16,
    /// Restrict the watch to one namespace; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Delay before restarting the watch after the stream ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
    pub log_format: LogFormat,
    /// Enable color in text format logs
    pub log_enable_color: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_namespace: None,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            log_level: None,
            log_format: LogFormat::Text,
            log_enable_color: false,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backoff_min_secs =
            var_or_default(&lookup, "BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS);
        let backoff_max_secs =
            var_or_default(&lookup, "BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS);
        Self {
            backoff_min_secs,
            // A ceiling below the floor would never let the sequence grow
            backoff_max_secs: backoff_max_secs.max(backoff_min_secs),
            max_concurrent_reconciliations: var_or_default(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            watch_namespace: var_opt_str(&lookup, "WATCH_NAMESPACE"),
            watch_restart_delay_secs: var_or_default(
                &lookup,
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            log_level: var_opt_str(&lookup, "LOG_LEVEL"),
            log_format: var_or_default(&lookup, "LOG_FORMAT", LogFormat::Text),
            log_enable_color: var_or_default_bool(&lookup, "LOG_ENABLE_COLOR", false),
        }
    }

    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}
