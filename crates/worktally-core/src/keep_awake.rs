//! Keep-awake heartbeat while a timer is being driven in the foreground.
//!
//! The heartbeat is a detached interval task. A failed beat is logged and the
//! loop carries on; it never touches timer state.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Handle to a running heartbeat. Dropping it stops the heartbeat.
pub struct KeepAwake {
    handle: JoinHandle<()>,
}

impl KeepAwake {
    /// Call `beat` now and then every `every` until stopped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, E>(every: Duration, mut beat: F) -> Self
    where
        F: FnMut() -> Result<(), E> + Send + 'static,
        E: Display + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = beat() {
                    warn!(error = %e, "keep-awake heartbeat failed");
                }
            }
        });
        debug!(interval_secs = every.as_secs(), "keep-awake started");
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for KeepAwake {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("keep-awake stopped");
    }
}

/// A beat that rewrites `path` with the current time.
pub fn heartbeat_file(path: PathBuf) -> impl FnMut() -> Result<(), io::Error> + Send + 'static {
    move || std::fs::write(&path, Utc::now().to_rfc3339())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn beats_immediately_and_on_every_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let keep_awake = KeepAwake::start(Duration::from_secs(30), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), io::Error>(())
        });

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert!(keep_awake.is_running());
        keep_awake.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_beat_does_not_stop_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let keep_awake = KeepAwake::start(Duration::from_secs(30), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err("display asleep")
            } else {
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(keep_awake.is_running());
    }

    #[test]
    fn heartbeat_file_writes_a_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heartbeat");
        let mut beat = heartbeat_file(path.clone());
        beat().unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&written).is_ok());
    }
}
