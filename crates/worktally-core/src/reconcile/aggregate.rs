//! Per-day and per-period totals over persisted sessions.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::session::WorkSession;

/// Time spent on one task within an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTotal {
    pub task_name: String,
    pub time_seconds: u64,
    pub session_count: u64,
}

/// Totals for one calendar day. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_seconds: u64,
    pub session_count: u64,
    /// Sorted by descending time; equal totals keep first-seen order.
    pub task_breakdown: Vec<TaskTotal>,
    pub daily_goal_hours: f64,
    pub goal_progress_percentage: u64,
}

impl DailyAggregate {
    pub fn is_empty(&self) -> bool {
        self.session_count == 0 || self.total_seconds == 0
    }
}

/// Calendar date of `ts` as seen from `tz`.
pub(crate) fn local_date<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// `round(total / goal * 100)`, unbounded above. A non-positive goal yields 0.
pub fn goal_progress_percentage(total_seconds: u64, daily_goal_hours: f64) -> u64 {
    if !daily_goal_hours.is_finite() || daily_goal_hours <= 0.0 {
        return 0;
    }
    let pct = total_seconds as f64 * 100.0 / (daily_goal_hours * 3600.0);
    pct.round() as u64
}

/// Aggregate the sessions that started on `date` in `tz`.
pub fn daily_aggregate<Tz: TimeZone>(
    sessions: &[WorkSession],
    date: NaiveDate,
    tz: &Tz,
    daily_goal_hours: f64,
) -> DailyAggregate {
    let mut total_seconds = 0;
    let mut session_count = 0;
    let mut breakdown: Vec<TaskTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for session in sessions
        .iter()
        .filter(|s| local_date(s.start_time, tz) == date)
    {
        total_seconds += session.duration_seconds;
        session_count += 1;

        let slot = *index.entry(session.task_name.as_str()).or_insert_with(|| {
            breakdown.push(TaskTotal {
                task_name: session.task_name.clone(),
                time_seconds: 0,
                session_count: 0,
            });
            breakdown.len() - 1
        });
        breakdown[slot].time_seconds += session.duration_seconds;
        breakdown[slot].session_count += 1;
    }

    // Stable sort keeps first-seen order among ties.
    breakdown.sort_by(|a, b| b.time_seconds.cmp(&a.time_seconds));

    DailyAggregate {
        date,
        total_seconds,
        session_count,
        task_breakdown: breakdown,
        daily_goal_hours,
        goal_progress_percentage: goal_progress_percentage(total_seconds, daily_goal_hours),
    }
}

/// Dashboard ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    Today,
    Yesterday,
    /// Monday through Sunday of the current week.
    ThisWeek,
    /// The trailing 7 × 24 hours up to now.
    Last7Days,
}

impl Period {
    pub fn contains<Tz: TimeZone>(&self, ts: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> bool {
        let today = local_date(now, tz);
        let day = local_date(ts, tz);
        match self {
            Period::Today => day == today,
            Period::Yesterday => today.pred_opt() == Some(day),
            Period::ThisWeek => day.iso_week() == today.iso_week(),
            Period::Last7Days => ts >= now - Duration::days(7) && ts <= now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub period: Period,
    pub total_seconds: u64,
    pub session_count: u64,
}

pub fn period_total<Tz: TimeZone>(
    sessions: &[WorkSession],
    period: Period,
    now: DateTime<Utc>,
    tz: &Tz,
) -> PeriodTotal {
    let (total_seconds, session_count) = sessions
        .iter()
        .filter(|s| period.contains(s.start_time, now, tz))
        .fold((0, 0), |(secs, count), s| (secs + s.duration_seconds, count + 1));
    PeriodTotal {
        period,
        total_seconds,
        session_count,
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use uuid::Uuid;

    use super::*;

    fn session(task: &str, start: DateTime<Utc>, dur: u64) -> WorkSession {
        WorkSession {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            task_name: task.into(),
            start_time: start,
            end_time: Some(start + Duration::seconds(dur as i64)),
            duration_seconds: dur,
            notes: None,
            tags: Vec::new(),
            created_at: start,
            updated_at: start,
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn aggregates_by_task_sorted_by_time() {
        let sessions = vec![
            session("A", ts("2024-03-01T09:00:00Z"), 600),
            session("B", ts("2024-03-01T10:00:00Z"), 300),
            session("A", ts("2024-03-01T11:00:00Z"), 300),
        ];
        let agg = daily_aggregate(&sessions, day("2024-03-01"), &Utc, 1.0);

        assert_eq!(agg.total_seconds, 1200);
        assert_eq!(agg.session_count, 3);
        assert_eq!(
            agg.task_breakdown,
            vec![
                TaskTotal { task_name: "A".into(), time_seconds: 900, session_count: 2 },
                TaskTotal { task_name: "B".into(), time_seconds: 300, session_count: 1 },
            ]
        );
        assert_eq!(agg.goal_progress_percentage, 33);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let sessions = vec![
            session("Second", ts("2024-03-01T12:00:00Z"), 60),
            session("First", ts("2024-03-01T09:00:00Z"), 60),
        ];
        let agg = daily_aggregate(&sessions, day("2024-03-01"), &Utc, 6.0);
        let names: Vec<_> = agg.task_breakdown.iter().map(|t| t.task_name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn other_days_are_excluded() {
        let sessions = vec![
            session("A", ts("2024-02-29T23:59:59Z"), 100),
            session("A", ts("2024-03-01T00:00:00Z"), 50),
            session("A", ts("2024-03-02T00:00:00Z"), 25),
        ];
        let agg = daily_aggregate(&sessions, day("2024-03-01"), &Utc, 6.0);
        assert_eq!(agg.total_seconds, 50);
        assert_eq!(agg.session_count, 1);
    }

    #[test]
    fn calendar_day_follows_the_given_zone() {
        // 23:30 UTC on the 1st is already the 2nd in UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let sessions = vec![session("Late", ts("2024-03-01T23:30:00Z"), 600)];

        assert_eq!(daily_aggregate(&sessions, day("2024-03-01"), &Utc, 6.0).total_seconds, 600);
        assert_eq!(daily_aggregate(&sessions, day("2024-03-01"), &plus_two, 6.0).total_seconds, 0);
        assert_eq!(daily_aggregate(&sessions, day("2024-03-02"), &plus_two, 6.0).total_seconds, 600);
    }

    #[test]
    fn goal_progress_can_exceed_hundred() {
        assert_eq!(goal_progress_percentage(3 * 3600, 2.0), 150);
        assert_eq!(goal_progress_percentage(1800, 1.0), 50);
        assert_eq!(goal_progress_percentage(0, 6.0), 0);
    }

    #[test]
    fn goal_progress_rounds_half_up() {
        // 18 s of a 1 h goal is exactly 0.5 %.
        assert_eq!(goal_progress_percentage(18, 1.0), 1);
        assert_eq!(goal_progress_percentage(17, 1.0), 0);
    }

    #[test]
    fn zero_goal_yields_zero_progress() {
        assert_eq!(goal_progress_percentage(3600, 0.0), 0);
        assert_eq!(goal_progress_percentage(3600, -1.0), 0);
    }

    #[test]
    fn empty_day_is_empty() {
        let agg = daily_aggregate(&[], day("2024-03-01"), &Utc, 6.0);
        assert!(agg.is_empty());
        assert!(agg.task_breakdown.is_empty());
    }

    #[test]
    fn period_totals() {
        // Friday 2024-03-08, 12:00 UTC.
        let now = ts("2024-03-08T12:00:00Z");
        let sessions = vec![
            session("today", ts("2024-03-08T08:00:00Z"), 100),
            session("yesterday", ts("2024-03-07T08:00:00Z"), 200),
            session("monday", ts("2024-03-04T08:00:00Z"), 400),
            session("last sunday", ts("2024-03-03T08:00:00Z"), 800),
            session("old", ts("2024-02-20T08:00:00Z"), 1600),
        ];

        let today = period_total(&sessions, Period::Today, now, &Utc);
        assert_eq!((today.total_seconds, today.session_count), (100, 1));

        let yesterday = period_total(&sessions, Period::Yesterday, now, &Utc);
        assert_eq!(yesterday.total_seconds, 200);

        let week = period_total(&sessions, Period::ThisWeek, now, &Utc);
        assert_eq!(week.total_seconds, 700);

        let last7 = period_total(&sessions, Period::Last7Days, now, &Utc);
        assert_eq!(last7.total_seconds, 1500);
    }
}
