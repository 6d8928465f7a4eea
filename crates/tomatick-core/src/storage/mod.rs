mod config;
pub mod database;

pub use config::{Config, GoalsConfig, ScheduleConfig, TimerConfig};
pub use database::{Database, SessionRecord, Stats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml` and `tomatick.db`.
///
/// `TOMATICK_DATA_DIR` overrides the location entirely. Otherwise it is
/// `~/.config/tomatick[-dev]/`, with `TOMATICK_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TOMATICK_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TOMATICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tomatick-dev")
            } else {
                base_dir.join("tomatick")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
