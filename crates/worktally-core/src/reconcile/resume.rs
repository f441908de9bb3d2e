//! Picking the session a resumed task should reattach to.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::local_date;
use crate::session::{SessionId, WorkSession};

/// Reattachment target for a task, plus what has been banked on it that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resumable {
    pub task_name: String,
    /// Most recently started session for the task on the day.
    pub session_id: SessionId,
    pub last_started_at: DateTime<Utc>,
    /// Sum over every session of the task on the day, not just the target.
    pub total_seconds: u64,
    pub session_count: u64,
}

/// Find the session `task_name` should reattach to on `date`.
///
/// Earlier same-day sessions contribute to `total_seconds` but are not
/// themselves updated by the next stop.
pub fn find_resumable<Tz: TimeZone>(
    sessions: &[WorkSession],
    task_name: &str,
    date: NaiveDate,
    tz: &Tz,
) -> Option<Resumable> {
    let mut found: Option<Resumable> = None;
    for session in sessions
        .iter()
        .filter(|s| s.task_name == task_name && local_date(s.start_time, tz) == date)
    {
        absorb(&mut found, session);
    }
    found
}

/// Distinct tasks worked on `date`, newest first, at most `limit`.
pub fn recent_tasks<Tz: TimeZone>(
    sessions: &[WorkSession],
    date: NaiveDate,
    tz: &Tz,
    limit: usize,
) -> Vec<Resumable> {
    let mut by_task: HashMap<&str, Option<Resumable>> = HashMap::new();
    for session in sessions
        .iter()
        .filter(|s| local_date(s.start_time, tz) == date)
    {
        absorb(by_task.entry(session.task_name.as_str()).or_default(), session);
    }

    let mut tasks: Vec<Resumable> = by_task.into_values().flatten().collect();
    tasks.sort_by(|a, b| {
        b.last_started_at
            .cmp(&a.last_started_at)
            .then_with(|| a.task_name.cmp(&b.task_name))
    });
    tasks.truncate(limit);
    tasks
}

fn absorb(slot: &mut Option<Resumable>, session: &WorkSession) {
    match slot {
        None => {
            *slot = Some(Resumable {
                task_name: session.task_name.clone(),
                session_id: session.id,
                last_started_at: session.start_time,
                total_seconds: session.duration_seconds,
                session_count: 1,
            });
        }
        Some(r) => {
            r.total_seconds += session.duration_seconds;
            r.session_count += 1;
            // Strictly later only: on a tie the earlier-listed (newer
            // created) session wins.
            if session.start_time > r.last_started_at {
                r.session_id = session.id;
                r.last_started_at = session.start_time;
            }
        }
    }
}
