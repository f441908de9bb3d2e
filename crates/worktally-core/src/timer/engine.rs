//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based stopwatch for a single named task.
//! It does not use internal threads and never reads the clock itself: every
//! operation takes `now`, and elapsed time is always recomputed from the
//! stored segment start, so skipped or late ticks cannot cause drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!   ^        |          |
//!   +--------+---stop---+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start("Write report", Utc::now())?;
//! // In a loop:
//! let elapsed = engine.tick(Utc::now());
//! // Later:
//! let outcome = engine.stop(Utc::now(), &store)?;
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TimerError;
use crate::events::Event;
use crate::reconcile::{persist_finalized, FinalizedSession, PersistOutcome};
use crate::session::{NewSession, SessionId, SessionStore, SessionUpdate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Read-only view of the engine for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub task_name: String,
    pub elapsed_secs: u64,
    pub accumulated_secs: u64,
    /// Start of the running segment. Only set while running.
    pub segment_started_at: Option<DateTime<Utc>>,
    /// First start of this task occurrence.
    pub started_at: Option<DateTime<Utc>>,
    pub reattached_session: Option<SessionId>,
    pub at: DateTime<Utc>,
}

/// What `stop` did: the stop event plus whatever storage said.
#[derive(Debug)]
pub struct StopOutcome {
    pub event: Event,
    pub persisted: PersistOutcome,
}

/// Core timer engine.
///
/// Serializable so a driver can park it between process runs and pick up the
/// same task after a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    phase: TimerPhase,
    task_name: String,
    #[serde(default)]
    segment_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    /// Whole seconds banked from finished running segments.
    accumulated_secs: u64,
    #[serde(default)]
    reattached_session: Option<SessionId>,
}

impl TimerEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn accumulated_secs(&self) -> u64 {
        self.accumulated_secs
    }

    pub fn reattached_session(&self) -> Option<SessionId> {
        self.reattached_session
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Elapsed seconds as of `now`. Pure read.
    pub fn tick(&self, now: DateTime<Utc>) -> u64 {
        match self.segment_started_at {
            Some(since) => self.accumulated_secs + whole_secs_between(since, now),
            None => self.accumulated_secs,
        }
    }

    pub fn current_state(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            task_name: self.task_name.clone(),
            elapsed_secs: self.tick(now),
            accumulated_secs: self.accumulated_secs,
            segment_started_at: self.segment_started_at,
            started_at: self.started_at,
            reattached_session: self.reattached_session,
            at: now,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot(self.current_state(now))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, task_name: &str, now: DateTime<Utc>) -> Result<Event, TimerError> {
        self.require("start", &[TimerPhase::Idle])?;
        let task_name = normalize_task_name(task_name)?;
        self.begin(task_name, now, 0, None);
        Ok(self.started_event(now))
    }

    /// Start timing against a session that is already persisted.
    ///
    /// `accumulated_secs` is what has already been banked for the task, so the
    /// display continues from there and `stop` updates `session_id` in place.
    pub fn resume_existing(
        &mut self,
        task_name: &str,
        session_id: SessionId,
        accumulated_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Event, TimerError> {
        self.require("resume an existing task", &[TimerPhase::Idle])?;
        let task_name = normalize_task_name(task_name)?;
        self.begin(task_name, now, accumulated_secs, Some(session_id));
        Ok(self.started_event(now))
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Event, TimerError> {
        self.require("pause", &[TimerPhase::Running])?;
        // Flush the running segment into the bank.
        self.accumulated_secs = self.tick(now);
        self.segment_started_at = None;
        self.phase = TimerPhase::Paused;
        debug!(task = %self.task_name, elapsed_secs = self.accumulated_secs, "timer paused");
        Ok(Event::TimerPaused {
            elapsed_secs: self.accumulated_secs,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Event, TimerError> {
        self.require("resume", &[TimerPhase::Paused])?;
        self.segment_started_at = Some(now);
        self.phase = TimerPhase::Running;
        debug!(task = %self.task_name, "timer resumed");
        Ok(Event::TimerResumed {
            elapsed_secs: self.accumulated_secs,
            at: now,
        })
    }

    pub fn rename(&mut self, task_name: &str, now: DateTime<Utc>) -> Result<Event, TimerError> {
        self.require("rename", &[TimerPhase::Running, TimerPhase::Paused])?;
        let to = normalize_task_name(task_name)?;
        let from = std::mem::replace(&mut self.task_name, to.clone());
        Ok(Event::TaskRenamed { from, to, at: now })
    }

    /// Close out the current task and reset to idle.
    ///
    /// Returns what should be written to storage: nothing when no time was
    /// banked, an update when reattached, otherwise a new session.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<FinalizedSession, TimerError> {
        self.require("stop", &[TimerPhase::Running, TimerPhase::Paused])?;
        let duration_seconds = self.tick(now);
        let finished = std::mem::take(self);
        debug!(task = %finished.task_name, duration_seconds, "timer stopped");

        if duration_seconds == 0 {
            return Ok(FinalizedSession::Empty {
                task_name: finished.task_name,
            });
        }

        let finalized = match finished.reattached_session {
            Some(id) => FinalizedSession::Update {
                id,
                task_name: finished.task_name,
                update: SessionUpdate {
                    end_time: now,
                    duration_seconds,
                },
            },
            None => FinalizedSession::Create(NewSession {
                task_name: finished.task_name,
                start_time: finished.started_at.unwrap_or(now),
                end_time: now,
                duration_seconds,
                notes: None,
                tags: Vec::new(),
            }),
        };
        Ok(finalized)
    }

    /// Finalize and hand the result to `store`.
    ///
    /// The engine is idle afterwards even if storage failed; the failure is
    /// reported in [`StopOutcome::persisted`].
    pub fn stop(
        &mut self,
        now: DateTime<Utc>,
        store: &dyn SessionStore,
    ) -> Result<StopOutcome, TimerError> {
        let finalized = self.finalize(now)?;
        let event = Event::TimerStopped {
            task_name: finalized.task_name().to_string(),
            elapsed_secs: finalized.duration_seconds(),
            at: now,
        };
        let persisted = persist_finalized(finalized, store);
        Ok(StopOutcome { event, persisted })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(&self, operation: &'static str, allowed: &[TimerPhase]) -> Result<(), TimerError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TimerError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    fn begin(
        &mut self,
        task_name: String,
        now: DateTime<Utc>,
        accumulated_secs: u64,
        reattached_session: Option<SessionId>,
    ) {
        *self = Self {
            phase: TimerPhase::Running,
            task_name,
            segment_started_at: Some(now),
            started_at: Some(now),
            accumulated_secs,
            reattached_session,
        };
        debug!(
            task = %self.task_name,
            accumulated_secs,
            reattached = reattached_session.is_some(),
            "timer started"
        );
    }

    fn started_event(&self, now: DateTime<Utc>) -> Event {
        Event::TimerStarted {
            task_name: self.task_name.clone(),
            resumed_session: self.reattached_session,
            elapsed_secs: self.accumulated_secs,
            at: now,
        }
    }
}

fn normalize_task_name(task_name: &str) -> Result<String, TimerError> {
    let trimmed = task_name.trim();
    if trimmed.is_empty() {
        return Err(TimerError::EmptyTaskName);
    }
    Ok(trimmed.to_string())
}

/// Whole seconds from `from` to `to`, floored; a clock that went backwards
/// counts as zero.
fn whole_secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}
