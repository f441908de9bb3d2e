//! Session reconciliation.
//!
//! Everything here is pure over already persisted [`WorkSession`] records,
//! except [`persist_finalized`], which is the one place a stopped timer's
//! create-or-update decision meets storage.
//!
//! [`WorkSession`]: crate::session::WorkSession

mod aggregate;
mod dispatch;
mod report;
mod resume;

pub use aggregate::{
    daily_aggregate, goal_progress_percentage, period_total, DailyAggregate, Period, PeriodTotal,
    TaskTotal,
};
pub use dispatch::{persist_finalized, FinalizedSession, PersistOutcome};
pub use report::{
    build_shareable_snapshot, ExpiryPolicy, ReportOptions, ReportSnapshot, SharedReport,
};
pub use resume::{find_resumable, recent_tasks, Resumable};
