//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Reason recorded on manual slot blocks.
    pub block_reason: String,
    /// Reason recorded on all-day blocks.
    pub closed_reason: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("slotbook.db"),
            block_reason: "blocked".to_string(),
            closed_reason: "closed".to_string(),
        }
    }
}

impl Config {
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

        // SB_DATABASE_PATH, SB_BLOCK_REASON, SB_CLOSED_REASON
        figment = figment.merge(Env::prefixed("SB_"));

        figment.extract()
    }

    /// Default reason for a slot block, or for an all-day block when no time is given.
    pub fn reason_for(&self, time_given: bool) -> &str {
        if time_given {
            &self.block_reason
        } else {
            &self.closed_reason
        }
    }
}

/// Returns the platform-specific config directory for slotbook.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("slotbook"))
}

/// Returns the platform-specific data directory for slotbook.
///
/// On Linux: `~/.local/share/slotbook`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("slotbook"))
}
