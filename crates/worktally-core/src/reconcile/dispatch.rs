//! Create-or-update dispatch for a stopped timer.

use tracing::{info, warn};

use crate::error::StorageError;
use crate::session::{NewSession, SessionId, SessionStore, SessionUpdate, WorkSession};

/// What a stopped timer wants written.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizedSession {
    /// No whole second was banked; nothing to save.
    Empty { task_name: String },
    /// Fresh task: insert a new record.
    Create(NewSession),
    /// Reattached task: overwrite end time and duration of `id`.
    Update {
        id: SessionId,
        task_name: String,
        update: SessionUpdate,
    },
}

impl FinalizedSession {
    pub fn task_name(&self) -> &str {
        match self {
            FinalizedSession::Empty { task_name } => task_name,
            FinalizedSession::Create(session) => &session.task_name,
            FinalizedSession::Update { task_name, .. } => task_name,
        }
    }

    pub fn duration_seconds(&self) -> u64 {
        match self {
            FinalizedSession::Empty { .. } => 0,
            FinalizedSession::Create(session) => session.duration_seconds,
            FinalizedSession::Update { update, .. } => update.duration_seconds,
        }
    }
}

/// Result of handing a [`FinalizedSession`] to storage.
#[derive(Debug)]
pub enum PersistOutcome {
    Skipped,
    Created(WorkSession),
    Updated(WorkSession),
    Failed(StorageError),
}

impl PersistOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistOutcome::Failed(_))
    }

    /// The stored record, when storage returned one.
    pub fn session(&self) -> Option<&WorkSession> {
        match self {
            PersistOutcome::Created(s) | PersistOutcome::Updated(s) => Some(s),
            PersistOutcome::Skipped | PersistOutcome::Failed(_) => None,
        }
    }
}

/// Write a finalized session through `store`.
///
/// Never returns an error: a storage failure is logged and carried in
/// [`PersistOutcome::Failed`] so the caller can show it without the timer
/// getting stuck.
pub fn persist_finalized(finalized: FinalizedSession, store: &dyn SessionStore) -> PersistOutcome {
    let result = match finalized {
        FinalizedSession::Empty { task_name } => {
            info!(task = %task_name, "nothing banked, session not saved");
            return PersistOutcome::Skipped;
        }
        FinalizedSession::Create(session) => {
            store.create_session(session).map(PersistOutcome::Created)
        }
        FinalizedSession::Update { id, update, .. } => {
            store.update_session(id, update).map(PersistOutcome::Updated)
        }
    };

    match result {
        Ok(outcome) => {
            if let Some(session) = outcome.session() {
                info!(
                    session_id = %session.id,
                    task = %session.task_name,
                    duration_seconds = session.duration_seconds,
                    "session saved"
                );
            }
            outcome
        }
        Err(err) => {
            warn!(error = %err, "failed to save session");
            PersistOutcome::Failed(err)
        }
    }
}
