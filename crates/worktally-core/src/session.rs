//! Work session records and the persistence seam the timer stops into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;

/// Identifier assigned by storage when a session is inserted.
pub type SessionId = Uuid;

/// A persisted block of work on one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: SessionId,
    pub user_id: String,
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for inserting a brand-new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The only fields a reattached stop is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u64,
}

/// Storage operations the timer needs when a task is stopped.
///
/// Implementations are owner-scoped: whoever implements this already knows
/// which identity the records belong to.
pub trait SessionStore {
    /// Insert a new session. Fails with `NotAuthenticated` when there is no
    /// identity to own it.
    fn create_session(&self, session: NewSession) -> Result<WorkSession, StorageError>;

    /// Overwrite end time and duration of an existing session. Fails with
    /// `NotFound` when the record is gone.
    fn update_session(
        &self,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<WorkSession, StorageError>;
}
