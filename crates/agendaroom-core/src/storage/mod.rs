mod config;
pub mod database;

pub use config::{Config, NotificationsConfig, TimerConfig};
pub use database::{Database, MeetingRecord};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/agendaroom[-dev]/` based on AGENDAROOM_ENV.
///
/// Set AGENDAROOM_ENV=dev to use development data directory, or
/// AGENDAROOM_DATA_DIR to use an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("AGENDAROOM_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("AGENDAROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("agendaroom-dev")
            } else {
                base_dir.join("agendaroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
