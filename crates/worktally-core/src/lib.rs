//! # Worktally Core Library
//!
//! This library provides the core logic for Worktally, a personal task timer
//! that banks time against named tasks and reconciles it into daily totals.
//! All operations are available through the standalone `worktally` CLI; the
//! library itself never reads the clock on its own and owns no global state.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based stopwatch state machine. Callers pass
//!   `now` into every operation and invoke `tick()` for progress updates
//! - **Reconciler**: Create-or-update decision at stop, resume lookup, daily
//!   aggregates and shareable report snapshots
//! - **Storage**: SQLite-based, owner-scoped session storage and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionStore`]: Persistence seam the engine stops into
//! - [`Database`]: Sessions, settings and published reports
//! - [`Config`]: Application configuration management

pub mod background;
pub mod error;
pub mod events;
pub mod identity;
pub mod keep_awake;
pub mod reconcile;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ReportError, StorageError, TimerError, ValidationError};
pub use events::Event;
pub use identity::Identity;
pub use keep_awake::KeepAwake;
pub use reconcile::{
    build_shareable_snapshot, daily_aggregate, find_resumable, persist_finalized, period_total,
    recent_tasks, DailyAggregate, ExpiryPolicy, FinalizedSession, Period, PersistOutcome,
    ReportOptions, ReportSnapshot, Resumable, SharedReport,
};
pub use session::{NewSession, SessionId, SessionStore, SessionUpdate, WorkSession};
pub use settings::{SettingsPatch, Theme, UserSettings};
pub use storage::{Config, Database, SessionRepo};
pub use timer::{StopOutcome, TimerEngine, TimerPhase, TimerSnapshot};
