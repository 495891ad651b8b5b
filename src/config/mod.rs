//! # Configuration
//!
//! Operator settings loaded from environment variables.
//!
//! Environment variables are typically populated from a ConfigMap using
//! `envFrom` in the deployment. Unset or malformed values fall back to the
//! defaults in [`crate::constants`].

mod controller;
mod server;

pub use controller::{ControllerConfig, LogFormat};
pub use server::ServerConfig;

/// Read `key` through `lookup` and parse it, or return `default`
fn var_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read `key` as boolean (`true`, `1`, `yes`, `on`) or return `default`
fn var_or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.trim().to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read `key` as a non-empty string
fn var_opt_str<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
