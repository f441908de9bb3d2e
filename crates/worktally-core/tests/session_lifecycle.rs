//! Integration tests for the timer lifecycle against real SQLite storage.
//!
//! These walk the full path a driver takes: start or resume, stop, and read
//! the result back through the reconciler.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;
use worktally_core::{
    daily_aggregate, find_resumable, Database, Identity, NewSession, PersistOutcome, SessionRepo,
    SessionStore, StorageError, TimerEngine, TimerPhase,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

fn secs(n: i64) -> Duration {
    Duration::seconds(n)
}

#[test]
fn test_fresh_task_creates_then_resume_updates_in_place() {
    let db = Database::open_memory().unwrap();
    let repo = SessionRepo::new(&db, Identity::user("u1", "Sam"));
    let mut engine = TimerEngine::new();

    engine.start("Write report", t0()).unwrap();
    let outcome = engine.stop(t0() + secs(10), &repo).unwrap();
    let created = match outcome.persisted {
        PersistOutcome::Created(session) => session,
        other => panic!("expected a created session, got {other:?}"),
    };
    assert_eq!(created.duration_seconds, 10);
    assert_eq!(created.start_time, t0());

    // Later the same day the task is picked from the resume menu.
    let sessions = repo.list().unwrap();
    let target = find_resumable(&sessions, "Write report", day(), &Utc).unwrap();
    assert_eq!(target.session_id, created.id);
    assert_eq!(target.total_seconds, 10);

    let t1 = t0() + Duration::hours(2);
    engine
        .resume_existing("Write report", target.session_id, target.total_seconds, t1)
        .unwrap();
    engine.pause(t1 + secs(30)).unwrap();
    let outcome = engine.stop(t1 + secs(45), &repo).unwrap();

    let updated = match outcome.persisted {
        PersistOutcome::Updated(session) => session,
        other => panic!("expected an update, got {other:?}"),
    };
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.duration_seconds, 40);
    assert_eq!(updated.start_time, t0());
    assert_eq!(updated.end_time, Some(t1 + secs(45)));
    assert_eq!(repo.list().unwrap().len(), 1);
}

#[test]
fn test_immediate_stop_writes_nothing() {
    let db = Database::open_memory().unwrap();
    let repo = SessionRepo::new(&db, Identity::user("u1", "Sam"));
    let mut engine = TimerEngine::new();

    engine.start("Blink", t0()).unwrap();
    let outcome = engine.stop(t0(), &repo).unwrap();
    assert!(matches!(outcome.persisted, PersistOutcome::Skipped));
    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn test_deleted_target_fails_but_timer_resets() {
    let db = Database::open_memory().unwrap();
    let repo = SessionRepo::new(&db, Identity::user("u1", "Sam"));
    let mut engine = TimerEngine::new();

    engine
        .resume_existing("Gone", Uuid::new_v4(), 120, t0())
        .unwrap();
    let outcome = engine.stop(t0() + secs(30), &repo).unwrap();

    assert!(matches!(
        outcome.persisted,
        PersistOutcome::Failed(StorageError::NotFound { .. })
    ));
    assert_eq!(engine.phase(), TimerPhase::Idle);
    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn test_anonymous_stop_fails_with_not_authenticated() {
    let db = Database::open_memory().unwrap();
    let repo = SessionRepo::new(&db, Identity::Anonymous);
    let mut engine = TimerEngine::new();

    engine.start("Offline", t0()).unwrap();
    let outcome = engine.stop(t0() + secs(5), &repo).unwrap();

    assert!(matches!(
        outcome.persisted,
        PersistOutcome::Failed(StorageError::NotAuthenticated)
    ));
    assert_eq!(engine.phase(), TimerPhase::Idle);
}

#[test]
fn test_stored_sessions_aggregate_into_the_day() {
    let db = Database::open_memory().unwrap();
    let repo = SessionRepo::new(&db, Identity::user("u1", "Sam"));

    for (task, duration, offset_min) in [("A", 600, 0), ("B", 300, 20), ("A", 300, 40)] {
        let start = t0() + Duration::minutes(offset_min);
        repo.create_session(NewSession {
            task_name: task.into(),
            start_time: start,
            end_time: start + secs(duration),
            duration_seconds: duration as u64,
            notes: None,
            tags: Vec::new(),
        })
        .unwrap();
    }

    let aggregate = daily_aggregate(&repo.list().unwrap(), day(), &Utc, 1.0);
    assert_eq!(aggregate.total_seconds, 1200);
    assert_eq!(aggregate.session_count, 3);
    assert_eq!(aggregate.goal_progress_percentage, 33);
    assert_eq!(aggregate.task_breakdown[0].task_name, "A");
    assert_eq!(aggregate.task_breakdown[0].time_seconds, 900);
    assert_eq!(aggregate.task_breakdown[0].session_count, 2);
    assert_eq!(aggregate.task_breakdown[1].task_name, "B");
}

#[test]
fn test_parked_engine_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worktally.db");

    {
        let db = Database::open_at(&path).unwrap();
        let mut engine = TimerEngine::new();
        engine.start("Long haul", t0()).unwrap();
        db.kv_set("timer_engine", &serde_json::to_string(&engine).unwrap())
            .unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    let blob = db.kv_get("timer_engine").unwrap().unwrap();
    let engine: TimerEngine = serde_json::from_str(&blob).unwrap();
    assert_eq!(engine.phase(), TimerPhase::Running);
    assert_eq!(engine.tick(t0() + Duration::minutes(90)), 5400);
}
