use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use serde_json::json;
use worktally_core::{daily_aggregate, period_total, Period};

use super::{format_hms, print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Total for today
    Today,
    /// Total for yesterday
    Yesterday,
    /// Total for this week (Monday start)
    Week,
    /// Total for the last 7 days
    Last7,
    /// Full aggregate for one day
    Day {
        /// Date as YYYY-MM-DD (default: today)
        date: Option<NaiveDate>,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let ws = Workspace::open()?;
    let sessions = ws.repo().list()?;
    let now = Utc::now();

    let period = match action {
        StatsAction::Today => Period::Today,
        StatsAction::Yesterday => Period::Yesterday,
        StatsAction::Week => Period::ThisWeek,
        StatsAction::Last7 => Period::Last7Days,
        StatsAction::Day { date } => {
            let user_id = ws.identity.require()?;
            let goal = ws.db.get_settings(user_id)?.daily_goal_hours;
            let date = date.unwrap_or_else(|| now.with_timezone(&Local).date_naive());
            let aggregate = daily_aggregate(&sessions, date, &Local, goal);
            print_json(&aggregate)?;
            return Ok(());
        }
    };

    let total = period_total(&sessions, period, now, &Local);
    print_json(&json!({
        "period": total.period,
        "total_seconds": total.total_seconds,
        "total": format_hms(total.total_seconds),
        "session_count": total.session_count,
    }))?;
    Ok(())
}
