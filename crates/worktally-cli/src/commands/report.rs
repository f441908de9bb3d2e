use std::path::Path;

use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;
use worktally_core::background::spawn_detached_blocking;
use worktally_core::{build_shareable_snapshot, daily_aggregate, Database, ExpiryPolicy};

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Publish a day's aggregate as a shareable report
    Share {
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Expiry: 24h, 7d, 30d or end-of-next-day (default from config)
        #[arg(long)]
        expires: Option<ExpiryPolicy>,
        /// Omit the per-task breakdown
        #[arg(long)]
        no_details: bool,
        /// Omit goal progress
        #[arg(long)]
        no_goal: bool,
    },
    /// View a published report (no sign-in needed)
    View {
        /// Report ID
        id: Uuid,
    },
    /// List reports you published
    List,
    /// Stop serving a report
    Deactivate {
        /// Report ID
        id: Uuid,
    },
    /// Delete a report
    Delete {
        /// Report ID
        id: Uuid,
    },
}

pub fn run(action: ReportAction) -> CliResult {
    let ws = Workspace::open()?;
    let now = Utc::now();

    match action {
        ReportAction::Share {
            date,
            expires,
            no_details,
            no_goal,
        } => {
            let user_id = ws.identity.require()?;
            let goal = ws.db.get_settings(user_id)?.daily_goal_hours;
            let sessions = ws.repo().list()?;
            let date = date.unwrap_or_else(|| now.with_timezone(&Local).date_naive());
            let aggregate = daily_aggregate(&sessions, date, &Local, goal);

            let mut options = ws.config.report.options_for(ws.identity.display_name());
            options.include_task_details &= !no_details;
            options.include_goal_progress &= !no_goal;
            let expiry = expires.unwrap_or(ws.config.report.default_expiry);

            let snapshot = build_shareable_snapshot(&aggregate, &options, expiry, now, &Local);
            let report = ws.db.insert_shared_report(user_id, &snapshot)?;
            print_json(&json!({
                "id": report.id,
                "url": report.share_url(&ws.config.report.base_url),
                "expires_at": report.expires_at,
                "report": report.report_data,
            }))?;
        }
        ReportAction::View { id } => {
            let snapshot = ws.db.fetch_public_report(id, now)?;
            print_json(&snapshot)?;

            // Counting the view must never fail the fetch.
            if let Some(path) = ws.db.path().map(Path::to_path_buf) {
                spawn_detached_blocking("report view count", move || {
                    Database::open_at(&path)?.record_report_view(id)
                });
            }
        }
        ReportAction::List => {
            let user_id = ws.identity.require()?;
            print_json(&ws.db.list_shared_reports(user_id)?)?;
        }
        ReportAction::Deactivate { id } => {
            let user_id = ws.identity.require()?;
            let report = ws.db.set_report_active(user_id, id, false)?;
            println!("report deactivated: {}", report.id);
        }
        ReportAction::Delete { id } => {
            let user_id = ws.identity.require()?;
            ws.db.delete_shared_report(user_id, id)?;
            println!("report deleted: {id}");
        }
    }
    Ok(())
}
