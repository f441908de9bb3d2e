mod config;
pub mod database;
pub mod migrations;
mod repo;

pub use config::{Config, IdentityConfig, ReportConfig, TimerConfig};
pub use database::Database;
pub use repo::SessionRepo;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `WORKTALLY_HOME` wins outright. Otherwise `~/.config/worktally[-dev]/`,
/// where `WORKTALLY_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("WORKTALLY_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WORKTALLY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("worktally-dev")
            } else {
                base_dir.join("worktally")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
