use std::path::PathBuf;

use chrono::FixedOffset;

/// Default navigation target: the SF90 Stradale trends page, filtered to two
/// model-year buckets around the 90210 postal code.
pub const DEFAULT_TARGET_URL: &str = "https://www.autotempest.com/trends?make=ferrari&model=sf90stradale&year_buckets=2020-2021%2C2022-2024&zip=90210";

#[derive(Clone)]
pub struct AppConfig {
    /// Opaque navigation target; never parsed or validated here.
    pub target_url: String,
    pub log_level: String,
    pub max_clicks: usize,
    pub settle_ms: u64,
    pub nav_timeout_secs: u64,
    /// Fixed offset used to compute the per-run reference date.
    pub utc_offset: FixedOffset,
    pub capture_keywords: Vec<String>,
    pub listings_csv_path: PathBuf,
    pub network_dump_path: PathBuf,
    pub user_agent: String,
    pub headless: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Query strings can carry a postal code; keep only the path in logs.
        let target = match self.target_url.split_once('?') {
            Some((base, _)) => format!("{base}?[redacted]"),
            None => self.target_url.clone(),
        };
        f.debug_struct("AppConfig")
            .field("target_url", &target)
            .field("log_level", &self.log_level)
            .field("max_clicks", &self.max_clicks)
            .field("settle_ms", &self.settle_ms)
            .field("nav_timeout_secs", &self.nav_timeout_secs)
            .field("utc_offset", &self.utc_offset)
            .field("capture_keywords", &self.capture_keywords)
            .field("listings_csv_path", &self.listings_csv_path)
            .field("network_dump_path", &self.network_dump_path)
            .field("user_agent", &self.user_agent)
            .field("headless", &self.headless)
            .finish()
    }
}
