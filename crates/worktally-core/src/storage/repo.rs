//! Owner-scoped view over [`Database`].

use chrono::{DateTime, TimeZone, Utc};

use super::Database;
use crate::error::StorageError;
use crate::identity::Identity;
use crate::reconcile::{recent_tasks, Resumable};
use crate::session::{NewSession, SessionId, SessionStore, SessionUpdate, WorkSession};

/// Sessions of the current identity. Every call fails with
/// `NotAuthenticated` when the identity is anonymous.
pub struct SessionRepo<'a> {
    db: &'a Database,
    identity: Identity,
}

impl<'a> SessionRepo<'a> {
    pub fn new(db: &'a Database, identity: Identity) -> Self {
        Self { db, identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Newest created first.
    pub fn list(&self) -> Result<Vec<WorkSession>, StorageError> {
        self.db.list_sessions(self.identity.require()?)
    }

    pub fn delete(&self, id: SessionId) -> Result<(), StorageError> {
        self.db.delete_session(self.identity.require()?, id)
    }

    /// Today's distinct tasks, newest first, for the resume menu.
    pub fn recent<Tz: TimeZone>(
        &self,
        now: DateTime<Utc>,
        tz: &Tz,
        limit: usize,
    ) -> Result<Vec<Resumable>, StorageError> {
        let sessions = self.list()?;
        let today = now.with_timezone(tz).date_naive();
        Ok(recent_tasks(&sessions, today, tz, limit))
    }
}

impl SessionStore for SessionRepo<'_> {
    fn create_session(&self, session: NewSession) -> Result<WorkSession, StorageError> {
        self.db.insert_session(self.identity.require()?, &session)
    }

    fn update_session(
        &self,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<WorkSession, StorageError> {
        self.db.update_session(self.identity.require()?, id, update)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_session(task: &str, start: DateTime<Utc>, secs: i64) -> NewSession {
        NewSession {
            task_name: task.into(),
            start_time: start,
            end_time: start + Duration::seconds(secs),
            duration_seconds: secs as u64,
            notes: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn anonymous_calls_are_rejected() {
        let db = Database::open_memory().unwrap();
        let repo = SessionRepo::new(&db, Identity::Anonymous);
        let now = Utc::now();

        assert!(matches!(
            repo.create_session(new_session("A", now, 5)),
            Err(StorageError::NotAuthenticated)
        ));
        assert!(matches!(repo.list(), Err(StorageError::NotAuthenticated)));
        assert!(db.list_sessions("").unwrap().is_empty());
    }

    #[test]
    fn records_are_scoped_to_the_identity() {
        let db = Database::open_memory().unwrap();
        let alice = SessionRepo::new(&db, Identity::user("alice", "Alice"));
        let bob = SessionRepo::new(&db, Identity::user("bob", "Bob"));
        let now = Utc::now();

        let created = alice.create_session(new_session("A", now, 5)).unwrap();
        assert_eq!(created.user_id, "alice");
        assert!(bob.list().unwrap().is_empty());

        let update = SessionUpdate {
            end_time: now,
            duration_seconds: 99,
        };
        assert!(matches!(
            bob.update_session(created.id, update),
            Err(StorageError::NotFound { .. })
        ));
        assert!(bob.delete(created.id).is_err());

        alice.delete(created.id).unwrap();
        assert!(alice.list().unwrap().is_empty());
    }

    #[test]
    fn recent_lists_todays_tasks() {
        let db = Database::open_memory().unwrap();
        let repo = SessionRepo::new(&db, Identity::user("u1", "U"));
        let now = Utc::now();

        repo.create_session(new_session("A", now, 60)).unwrap();
        repo.create_session(new_session("B", now, 30)).unwrap();
        repo.create_session(new_session("Old", now - Duration::days(3), 30))
            .unwrap();

        let recent = repo.recent(now, &Utc, 5).unwrap();
        let names: Vec<&str> = recent.iter().map(|r| r.task_name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"A") && names.contains(&"B"));
    }
}
