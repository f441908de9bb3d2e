//! Per-owner preferences stored alongside sessions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_DAILY_GOAL_HOURS: f64 = 6.0;
pub const MIN_DAILY_GOAL_HOURS: f64 = 1.0;
pub const MAX_DAILY_GOAL_HOURS: f64 = 24.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(ValidationError::InvalidValue {
                field: "theme".into(),
                message: format!("expected light, dark or system, got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub daily_goal_hours: f64,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// What an owner gets before saving anything.
    pub fn defaults_for(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            daily_goal_hours: DEFAULT_DAILY_GOAL_HOURS,
            theme: Theme::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: &SettingsPatch, now: DateTime<Utc>) {
        if let Some(hours) = patch.daily_goal_hours {
            self.daily_goal_hours = hours;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        self.updated_at = now;
    }
}

/// Partial settings update; `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsPatch {
    pub daily_goal_hours: Option<f64>,
    pub theme: Option<Theme>,
}

impl SettingsPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(hours) = self.daily_goal_hours {
            if !(MIN_DAILY_GOAL_HOURS..=MAX_DAILY_GOAL_HOURS).contains(&hours) {
                return Err(ValidationError::OutOfRange {
                    field: "daily_goal_hours",
                    min: MIN_DAILY_GOAL_HOURS,
                    max: MAX_DAILY_GOAL_HOURS,
                    value: hours,
                });
            }
        }
        Ok(())
    }
}
