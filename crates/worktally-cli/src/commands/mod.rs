pub mod config;
pub mod report;
pub mod session;
pub mod settings;
pub mod stats;
pub mod timer;

use serde::Serialize;
use worktally_core::{Config, CoreError, Database, Identity, SessionRepo};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: config, the signed-in identity and storage.
pub struct Workspace {
    pub config: Config,
    pub identity: Identity,
    pub db: Database,
}

impl Workspace {
    pub fn open() -> Result<Self, CoreError> {
        let config = Config::load()?;
        let identity = Identity::from_config(&config.identity);
        let db = Database::open()?;
        Ok(Self {
            config,
            identity,
            db,
        })
    }

    pub fn repo(&self) -> SessionRepo<'_> {
        SessionRepo::new(&self.db, self.identity.clone())
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(format_hms(100 * 3600), "100:00:00");
    }
}
