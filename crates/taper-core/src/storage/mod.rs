mod config;
pub mod gateway;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use config::{Config, EngineSettings, NotificationsConfig};
pub use gateway::PersistenceGateway;
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `taper.db` and `config.toml`.
///
/// `TAPER_DATA_DIR` wins when set. Otherwise `~/.config/taper[-dev]/`,
/// with TAPER_ENV=dev selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TAPER_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TAPER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("taper-dev")
            } else {
                base_dir.join("taper")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
