//! Shareable daily report snapshots.
//!
//! A snapshot is an immutable copy of a [`DailyAggregate`] with a creation
//! and expiry time. The JSON shape of [`ReportSnapshot`] is what public
//! viewers read, so field names here are a wire format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::{local_date, DailyAggregate, TaskTotal};
use crate::error::ReportError;

/// Longest fixed span a report may stay viewable.
pub const MAX_EXPIRY_DAYS: i64 = 365;

/// How long a published report stays viewable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpiryPolicy {
    /// 23:59:59.999 local time on the calendar day after creation.
    EndOfNextDay,
    /// A fixed span after creation.
    After(Duration),
}

impl ExpiryPolicy {
    pub fn day() -> Self {
        ExpiryPolicy::After(Duration::hours(24))
    }

    pub fn week() -> Self {
        ExpiryPolicy::After(Duration::days(7))
    }

    pub fn month() -> Self {
        ExpiryPolicy::After(Duration::days(30))
    }

    /// Expiry instant for a report created at `now`.
    pub fn expires_at<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        match self {
            ExpiryPolicy::After(span) => saturating_add(now, *span),
            ExpiryPolicy::EndOfNextDay => {
                let fallback = saturating_add(now, Duration::days(1));
                local_date(now, tz)
                    .succ_opt()
                    .and_then(|day| day.and_hms_milli_opt(23, 59, 59, 999))
                    .and_then(|naive| tz.from_local_datetime(&naive).latest())
                    .map(|local| local.with_timezone(&Utc))
                    .unwrap_or(fallback)
            }
        }
    }
}

fn saturating_add(now: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    now.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        ExpiryPolicy::day()
    }
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryPolicy::EndOfNextDay => f.write_str("end-of-next-day"),
            ExpiryPolicy::After(span) => {
                let secs = span.num_seconds();
                if secs % 86_400 == 0 {
                    write!(f, "{}d", secs / 86_400)
                } else if secs % 3_600 == 0 {
                    write!(f, "{}h", secs / 3_600)
                } else {
                    write!(f, "{secs}s")
                }
            }
        }
    }
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    /// Accepts `end-of-next-day`, `<n>s`, `<n>h` or `<n>d`, up to
    /// [`MAX_EXPIRY_DAYS`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "end-of-next-day" {
            return Ok(ExpiryPolicy::EndOfNextDay);
        }
        let invalid = || {
            format!(
                "invalid expiry '{s}': expected e.g. 24h, 7d, 30d or end-of-next-day, at most {MAX_EXPIRY_DAYS}d"
            )
        };
        if s.len() < 2 || !s.is_char_boundary(s.len() - 1) {
            return Err(invalid());
        }
        let (count, unit) = s.split_at(s.len() - 1);
        let count: i64 = count.parse().map_err(|_| invalid())?;
        if count <= 0 {
            return Err(invalid());
        }
        let span = match unit {
            "s" => Duration::try_seconds(count),
            "h" => Duration::try_hours(count),
            "d" => Duration::try_days(count),
            _ => None,
        }
        .filter(|span| *span <= Duration::days(MAX_EXPIRY_DAYS))
        .ok_or_else(invalid)?;
        Ok(ExpiryPolicy::After(span))
    }
}

impl TryFrom<String> for ExpiryPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExpiryPolicy> for String {
    fn from(policy: ExpiryPolicy) -> Self {
        policy.to_string()
    }
}

/// Publisher-side choices that shape a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub user_name: String,
    pub include_task_details: bool,
    pub include_goal_progress: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            user_name: "User".to_string(),
            include_task_details: true,
            include_goal_progress: true,
        }
    }
}

/// The published payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub date: NaiveDate,
    pub user_name: String,
    pub total_time_seconds: u64,
    pub daily_goal_hours: f64,
    pub goal_progress_percentage: u64,
    pub task_breakdown: Vec<TaskTotal>,
    pub session_count: u64,
    pub includes_task_details: bool,
    pub includes_goal_progress: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Freeze `aggregate` into a publishable snapshot.
///
/// The expiry bound comes entirely from `expiry`; nothing here picks one.
pub fn build_shareable_snapshot<Tz: TimeZone>(
    aggregate: &DailyAggregate,
    options: &ReportOptions,
    expiry: ExpiryPolicy,
    now: DateTime<Utc>,
    tz: &Tz,
) -> ReportSnapshot {
    let task_breakdown = if options.include_task_details {
        aggregate.task_breakdown.clone()
    } else {
        Vec::new()
    };

    ReportSnapshot {
        date: aggregate.date,
        user_name: options.user_name.clone(),
        total_time_seconds: aggregate.total_seconds,
        daily_goal_hours: aggregate.daily_goal_hours,
        goal_progress_percentage: aggregate.goal_progress_percentage,
        task_breakdown,
        session_count: aggregate.session_count,
        includes_task_details: options.include_task_details,
        includes_goal_progress: options.include_goal_progress,
        created_at: now,
        expires_at: expiry.expires_at(now, tz),
    }
}

/// A published report as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedReport {
    pub id: Uuid,
    pub user_id: String,
    pub report_data: ReportSnapshot,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedReport {
    /// Gate a public fetch. Deactivation is checked before expiry, and an
    /// active report past its expiry is still `Expired`.
    pub fn viewable_at(&self, now: DateTime<Utc>) -> Result<&ReportSnapshot, ReportError> {
        if !self.is_active {
            return Err(ReportError::Deactivated);
        }
        if now > self.expires_at {
            return Err(ReportError::Expired {
                expired_at: self.expires_at,
            });
        }
        Ok(&self.report_data)
    }

    pub fn share_url(&self, base_url: &str) -> String {
        format!("{}/report/{}", base_url.trim_end_matches('/'), self.id)
    }
}
