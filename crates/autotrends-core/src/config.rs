use std::path::PathBuf;

use thiserror::Error;

use crate::app_config::{AppConfig, DEFAULT_TARGET_URL};
use crate::reference::parse_utc_offset;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; only malformed values are rejected.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let target_url = or_default("AUTOTRENDS_TARGET_URL", DEFAULT_TARGET_URL);
    let log_level = or_default("AUTOTRENDS_LOG_LEVEL", "info");

    let max_clicks = parse_usize("AUTOTRENDS_MAX_CLICKS", "200")?;
    let settle_ms = parse_u64("AUTOTRENDS_SETTLE_MS", "1200")?;
    let nav_timeout_secs = parse_u64("AUTOTRENDS_NAV_TIMEOUT_SECS", "60")?;

    let raw_offset = or_default("AUTOTRENDS_UTC_OFFSET", "+00:00");
    let utc_offset = parse_utc_offset(&raw_offset).ok_or_else(|| {
        invalid(
            "AUTOTRENDS_UTC_OFFSET",
            format!("\"{raw_offset}\" is not an offset like +01:00"),
        )
    })?;

    let capture_keywords =
        parse_keywords(&or_default("AUTOTRENDS_CAPTURE_KEYWORDS", "trends,chart,series"));
    if capture_keywords.is_empty() {
        return Err(invalid(
            "AUTOTRENDS_CAPTURE_KEYWORDS",
            "at least one keyword is required".to_string(),
        ));
    }

    let listings_csv_path = PathBuf::from(or_default(
        "AUTOTRENDS_LISTINGS_CSV",
        "sf90_autotempest_listings_full.csv",
    ));
    let network_dump_path = PathBuf::from(or_default(
        "AUTOTRENDS_NETWORK_DUMP",
        "sf90_chart_network_dump.json",
    ));
    let user_agent = or_default("AUTOTRENDS_USER_AGENT", "autotrends/0.1 (listing-trends)");
    let headless = parse_bool(&or_default("AUTOTRENDS_HEADLESS", "true"))
        .ok_or_else(|| invalid("AUTOTRENDS_HEADLESS", "expected true or false".to_string()))?;

    Ok(AppConfig {
        target_url,
        log_level,
        max_clicks,
        settle_ms,
        nav_timeout_secs,
        utc_offset,
        capture_keywords,
        listings_csv_path,
        network_dump_path,
        user_agent,
        headless,
    })
}

/// Split a comma-separated keyword list, dropping blanks. Case is kept.
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_owned())
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
