//! Fire-and-forget side effects.
//!
//! Work spawned here never gates the caller: failures are logged at `warn`
//! and dropped. Must be called from within a tokio runtime.

use std::fmt::Display;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Run blocking work (SQLite, filesystem) on the blocking pool and forget
/// about it.
pub fn spawn_detached_blocking<F, E>(label: &'static str, f: F) -> JoinHandle<()>
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: Display + 'static,
{
    tokio::task::spawn_blocking(move || match f() {
        Ok(()) => debug!(task = label, "background task finished"),
        Err(e) => warn!(task = label, error = %e, "background task failed"),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn failure_is_swallowed() {
        let handle = spawn_detached_blocking("failing", || Err::<(), _>("boom"));
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn blocking_work_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        spawn_detached_blocking("flag", move || {
            flag.store(true, Ordering::SeqCst);
            Ok::<(), std::io::Error>(())
        })
        .await
        .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
