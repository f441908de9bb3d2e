//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Work sessions, scoped by owner
//! - Per-owner preferences
//! - Published report snapshots
//! - Key-value store for application state (the parked timer engine)

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::{ReportError, Result, StorageError};
use crate::reconcile::{ReportSnapshot, SharedReport};
use crate::session::{NewSession, SessionId, SessionUpdate, WorkSession};
use crate::settings::{SettingsPatch, Theme, UserSettings};

const SESSION_COLUMNS: &str = "id, user_id, task_name, start_time, end_time, duration_seconds,
     notes, tags, created_at, updated_at";

const REPORT_COLUMNS: &str =
    "id, user_id, report_data, expires_at, is_active, view_count, created_at, updated_at";

/// SQLite database for worktally.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// File backing this database; `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Open the database at `<data dir>/worktally.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("worktally.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, path: None };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Insert a session owned by `user_id`. Storage assigns the id.
    pub fn insert_session(
        &self,
        user_id: &str,
        session: &NewSession,
    ) -> Result<WorkSession, StorageError> {
        let now = stored_now();
        let record = WorkSession {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            task_name: session.task_name.clone(),
            start_time: session.start_time,
            end_time: Some(session.end_time),
            duration_seconds: session.duration_seconds,
            notes: session.notes.clone(),
            tags: session.tags.clone(),
            created_at: now,
            updated_at: now,
        };
        let tags = serde_json::to_string(&record.tags)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO work_sessions
                (id, user_id, task_name, start_time, end_time, duration_seconds,
                 notes, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.to_string(),
                record.user_id,
                record.task_name,
                ts(record.start_time),
                record.end_time.map(ts),
                record.duration_seconds,
                record.notes,
                tags,
                ts(record.created_at),
                ts(record.updated_at),
            ],
        )?;
        debug!(session_id = %record.id, "session inserted");
        Ok(record)
    }

    /// Overwrite end time and duration. Other fields, including the start
    /// time, are never touched.
    pub fn update_session(
        &self,
        user_id: &str,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<WorkSession, StorageError> {
        let changed = self.conn.execute(
            "UPDATE work_sessions
             SET end_time = ?1, duration_seconds = ?2, updated_at = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![
                ts(update.end_time),
                update.duration_seconds,
                ts(stored_now()),
                id.to_string(),
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(session_not_found(id));
        }
        self.get_session(user_id, id)
    }

    pub fn get_session(&self, user_id: &str, id: SessionId) -> Result<WorkSession, StorageError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM work_sessions WHERE id = ?1 AND user_id = ?2");
        self.conn
            .query_row(&sql, params![id.to_string(), user_id], session_from_row)
            .optional()?
            .ok_or_else(|| session_not_found(id))
    }

    /// All sessions of `user_id`, newest created first.
    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<WorkSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], session_from_row)?;
        let sessions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    pub fn delete_session(&self, user_id: &str, id: SessionId) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "DELETE FROM work_sessions WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if changed == 0 {
            return Err(session_not_found(id));
        }
        Ok(())
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Stored settings, or defaults when the owner never saved any.
    pub fn get_settings(&self, user_id: &str) -> Result<UserSettings, StorageError> {
        let stored = self
            .conn
            .query_row(
                "SELECT user_id, daily_goal_hours, theme, created_at, updated_at
                 FROM user_preferences WHERE user_id = ?1",
                params![user_id],
                settings_from_row,
            )
            .optional()?;
        Ok(stored.unwrap_or_else(|| UserSettings::defaults_for(user_id, stored_now())))
    }

    /// Merge `patch` into the stored settings (upsert).
    ///
    /// # Errors
    /// Returns a validation error for out-of-range values before touching
    /// storage.
    pub fn save_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<UserSettings> {
        patch.validate()?;
        let mut settings = self.get_settings(user_id)?;
        settings.apply(patch, stored_now());
        self.conn.execute(
            "INSERT INTO user_preferences (user_id, daily_goal_hours, theme, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                daily_goal_hours = excluded.daily_goal_hours,
                theme = excluded.theme,
                updated_at = excluded.updated_at",
            params![
                settings.user_id,
                settings.daily_goal_hours,
                settings.theme.as_str(),
                ts(settings.created_at),
                ts(settings.updated_at),
            ],
        )?;
        Ok(settings)
    }

    // ── Shared reports ───────────────────────────────────────────────

    /// Publish a snapshot. Expiry is taken from the snapshot itself.
    pub fn insert_shared_report(
        &self,
        user_id: &str,
        snapshot: &ReportSnapshot,
    ) -> Result<SharedReport, StorageError> {
        let now = stored_now();
        let report = SharedReport {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            report_data: snapshot.clone(),
            expires_at: snapshot.expires_at,
            is_active: true,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        let data = serde_json::to_string(&report.report_data)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO shared_reports
                (id, user_id, report_data, expires_at, is_active, view_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, 0, ?5, ?6)",
            params![
                report.id.to_string(),
                report.user_id,
                data,
                ts(report.expires_at),
                ts(report.created_at),
                ts(report.updated_at),
            ],
        )?;
        info!(report_id = %report.id, expires_at = %report.expires_at, "report published");
        Ok(report)
    }

    /// Reports published by `user_id`, newest first.
    pub fn list_shared_reports(&self, user_id: &str) -> Result<Vec<SharedReport>, StorageError> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM shared_reports
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], report_from_row)?;
        let reports = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// Raw lookup with no expiry or activity checks.
    pub fn find_shared_report(&self, id: Uuid) -> Result<Option<SharedReport>, StorageError> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM shared_reports WHERE id = ?1");
        let report = self
            .conn
            .query_row(&sql, params![id.to_string()], report_from_row)
            .optional()?;
        Ok(report)
    }

    /// Public fetch: no identity required, but the report must be active and
    /// unexpired at `now`.
    pub fn fetch_public_report(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReportSnapshot, ReportError> {
        let report = self
            .find_shared_report(id)?
            .ok_or_else(|| ReportError::NotFound(id.to_string()))?;
        report.viewable_at(now).cloned()
    }

    pub fn set_report_active(
        &self,
        user_id: &str,
        id: Uuid,
        active: bool,
    ) -> Result<SharedReport, StorageError> {
        let changed = self.conn.execute(
            "UPDATE shared_reports SET is_active = ?1, updated_at = ?2
             WHERE id = ?3 AND user_id = ?4",
            params![active, ts(stored_now()), id.to_string(), user_id],
        )?;
        if changed == 0 {
            return Err(report_not_found(id));
        }
        self.find_shared_report(id)?.ok_or_else(|| report_not_found(id))
    }

    pub fn delete_shared_report(&self, user_id: &str, id: Uuid) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "DELETE FROM shared_reports WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if changed == 0 {
            return Err(report_not_found(id));
        }
        Ok(())
    }

    /// Bump the view counter. Callers treat failure as non-fatal.
    pub fn record_report_view(&self, id: Uuid) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "UPDATE shared_reports SET view_count = view_count + 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if changed == 0 {
            return Err(report_not_found(id));
        }
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Current time at the precision timestamps are stored with.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so lexical order is time order.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn session_not_found(id: SessionId) -> StorageError {
    StorageError::NotFound {
        entity: "session",
        id: id.to_string(),
    }
}

fn report_not_found(id: Uuid) -> StorageError {
    StorageError::NotFound {
        entity: "report",
        id: id.to_string(),
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<WorkSession> {
    let tags: String = row.get(7)?;
    Ok(WorkSession {
        id: get_uuid(row, 0)?,
        user_id: row.get(1)?,
        task_name: row.get(2)?,
        start_time: get_ts(row, 3)?,
        end_time: get_opt_ts(row, 4)?,
        duration_seconds: row.get(5)?,
        notes: row.get(6)?,
        tags: serde_json::from_str(&tags).map_err(|e| conversion_error(7, e))?,
        created_at: get_ts(row, 8)?,
        updated_at: get_ts(row, 9)?,
    })
}

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<UserSettings> {
    let theme: String = row.get(2)?;
    Ok(UserSettings {
        user_id: row.get(0)?,
        daily_goal_hours: row.get(1)?,
        theme: theme.parse::<Theme>().map_err(|e| conversion_error(2, e))?,
        created_at: get_ts(row, 3)?,
        updated_at: get_ts(row, 4)?,
    })
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<SharedReport> {
    let data: String = row.get(2)?;
    Ok(SharedReport {
        id: get_uuid(row, 0)?,
        user_id: row.get(1)?,
        report_data: serde_json::from_str(&data).map_err(|e| conversion_error(2, e))?,
        expires_at: get_ts(row, 3)?,
        is_active: row.get(4)?,
        view_count: row.get(5)?,
        created_at: get_ts(row, 6)?,
        updated_at: get_ts(row, 7)?,
    })
}
