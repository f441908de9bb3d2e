use clap::Subcommand;
use worktally_core::{SettingsPatch, Theme};

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Get,
    /// Set the daily goal in hours (1-24)
    SetGoal {
        hours: f64,
    },
    /// Set the theme (light, dark, system)
    SetTheme {
        theme: Theme,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let ws = Workspace::open()?;
    let user_id = ws.identity.require()?;

    let settings = match action {
        SettingsAction::Get => ws.db.get_settings(user_id)?,
        SettingsAction::SetGoal { hours } => ws.db.save_settings(
            user_id,
            &SettingsPatch {
                daily_goal_hours: Some(hours),
                theme: None,
            },
        )?,
        SettingsAction::SetTheme { theme } => ws.db.save_settings(
            user_id,
            &SettingsPatch {
                daily_goal_hours: None,
                theme: Some(theme),
            },
        )?,
    };
    print_json(&settings)?;
    Ok(())
}
