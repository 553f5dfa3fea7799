//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use ts_core::DEFAULT_HISTORY_LIMIT;
use ts_core::currency::{DEFAULT_BASE_CODE, DEFAULT_BASE_SYMBOL};

/// Trip used when `--trip` is not given and nothing is configured.
pub const DEFAULT_TRIP: &str = "default";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Trip id used when `--trip` is omitted.
    pub default_trip: String,
    /// Base currency code for newly created trips.
    pub base_currency: String,
    /// Symbol for the base currency of newly created trips.
    pub base_symbol: String,
    /// Undo steps kept per trip.
    pub history_limit: usize,
    /// Poll interval for `watch`.
    pub watch_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tripsplit.db"),
            default_trip: DEFAULT_TRIP.to_string(),
            base_currency: DEFAULT_BASE_CODE.to_string(),
            base_symbol: DEFAULT_BASE_SYMBOL.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            watch_interval_ms: 1_000,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TRIPSPLIT_DATABASE_PATH, TRIPSPLIT_DEFAULT_TRIP, ...
        figment = figment.merge(Env::prefixed("TRIPSPLIT_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for tripsplit.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tripsplit"))
}

/// Returns the platform-specific data directory for tripsplit.
///
/// On Linux: `~/.local/share/tripsplit`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tripsplit"))
}
