use chrono::{Local, Utc};
use clap::Subcommand;
use uuid::Uuid;

use super::{print_json, CliResult, Workspace};

/// Size of the resume menu.
const RECENT_LIMIT: usize = 5;

#[derive(Subcommand)]
pub enum SessionAction {
    /// List recorded sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: Uuid,
    },
    /// Today's tasks that can be resumed
    Recent,
}

pub fn run(action: SessionAction) -> CliResult {
    let ws = Workspace::open()?;
    let repo = ws.repo();

    match action {
        SessionAction::List { limit } => {
            let mut sessions = repo.list()?;
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            print_json(&sessions)?;
        }
        SessionAction::Delete { id } => {
            repo.delete(id)?;
            println!("session deleted: {id}");
        }
        SessionAction::Recent => {
            let recent = repo.recent(Utc::now(), &Local, RECENT_LIMIT)?;
            print_json(&recent)?;
        }
    }
    Ok(())
}
