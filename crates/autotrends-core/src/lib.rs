pub mod app_config;
pub mod config;
pub mod listings;
pub mod reference;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use listings::{ListingRecord, NetworkPayload};
pub use reference::{parse_utc_offset, reference_date};
