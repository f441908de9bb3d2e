use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::timer::TimerSnapshot;

/// Every timer state change produces an Event.
/// Drivers print or render them; nothing in the core subscribes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        task_name: String,
        /// Set when the timer reattached to an already persisted session.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resumed_session: Option<SessionId>,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TaskRenamed {
        from: String,
        to: String,
        at: DateTime<Utc>,
    },
    TimerStopped {
        task_name: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot(TimerSnapshot),
}
