mod config;
pub mod database;

pub use config::{Config, GoalsConfig, HistoryConfig, LogConfig, TimerConfig, UserConfig};
pub use database::SqliteGateway;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the studytime data directory, creating it if needed.
///
/// `STUDYTIME_DATA_DIR` wins outright. Otherwise `~/.config/studytime[-dev]/`
/// based on `STUDYTIME_ENV` (set it to `dev` for a scratch directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STUDYTIME_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYTIME_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studytime-dev")
            } else {
                base_dir.join("studytime")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
