use chrono::{Local, Utc};
use clap::Subcommand;
use serde_json::json;
use tracing::warn;
use worktally_core::keep_awake::heartbeat_file;
use worktally_core::storage::data_dir;
use worktally_core::{find_resumable, Database, KeepAwake, PersistOutcome, TimerEngine, TimerPhase};

use super::{format_hms, print_json, CliResult, Workspace};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing a new task
    Start {
        /// Task name
        name: String,
    },
    /// Continue a task already recorded today
    ResumeTask {
        /// Task name, as recorded
        name: String,
    },
    /// Pause the running timer
    Pause,
    /// Resume the paused timer
    Resume,
    /// Rename the current task
    Rename {
        /// New task name
        name: String,
    },
    /// Stop the timer and record the session
    Stop,
    /// Print current timer state as JSON
    Status,
    /// Follow the timer until it stops or Ctrl-C
    Watch,
}

fn load_engine(db: &Database) -> TimerEngine {
    match db.kv_get(ENGINE_KEY) {
        Ok(Some(json)) => serde_json::from_str::<TimerEngine>(&json).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable timer state");
            TimerEngine::new()
        }),
        Ok(None) => TimerEngine::new(),
        Err(e) => {
            warn!(error = %e, "could not read timer state");
            TimerEngine::new()
        }
    }
}

fn save_engine(db: &Database, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

pub async fn run(action: TimerAction) -> CliResult {
    let ws = Workspace::open()?;
    let mut engine = load_engine(&ws.db);
    let now = Utc::now();

    match action {
        TimerAction::Start { name } => {
            let event = engine.start(&name, now)?;
            save_engine(&ws.db, &engine)?;
            print_json(&event)?;
        }
        TimerAction::ResumeTask { name } => {
            let sessions = ws.repo().list()?;
            let today = now.with_timezone(&Local).date_naive();
            let target = find_resumable(&sessions, name.trim(), today, &Local)
                .ok_or_else(|| format!("no session for '{}' today; use `timer start`", name.trim()))?;
            let event =
                engine.resume_existing(&target.task_name, target.session_id, target.total_seconds, now)?;
            save_engine(&ws.db, &engine)?;
            print_json(&event)?;
        }
        TimerAction::Pause => {
            let event = engine.pause(now)?;
            save_engine(&ws.db, &engine)?;
            print_json(&event)?;
        }
        TimerAction::Resume => {
            let event = engine.resume(now)?;
            save_engine(&ws.db, &engine)?;
            print_json(&event)?;
        }
        TimerAction::Rename { name } => {
            let event = engine.rename(&name, now)?;
            save_engine(&ws.db, &engine)?;
            print_json(&event)?;
        }
        TimerAction::Stop => {
            let repo = ws.repo();
            let outcome = engine.stop(now, &repo)?;
            // Idle from here on, whatever storage said.
            save_engine(&ws.db, &engine)?;

            let persisted = match &outcome.persisted {
                PersistOutcome::Skipped => json!({ "status": "skipped" }),
                PersistOutcome::Created(s) => json!({ "status": "created", "session": s }),
                PersistOutcome::Updated(s) => json!({ "status": "updated", "session": s }),
                PersistOutcome::Failed(e) => json!({ "status": "failed", "error": e.to_string() }),
            };
            print_json(&json!({ "event": outcome.event, "persisted": persisted }))?;
            if let PersistOutcome::Failed(e) = outcome.persisted {
                return Err(format!("session was not saved: {e}").into());
            }
        }
        TimerAction::Status => {
            print_json(&engine.snapshot(now))?;
        }
        TimerAction::Watch => watch(&ws, engine).await?,
    }

    Ok(())
}

/// Print one status line per tick. Other invocations may pause or stop the
/// timer meanwhile, so state is reloaded every tick.
async fn watch(ws: &Workspace, mut engine: TimerEngine) -> CliResult {
    if engine.phase() == TimerPhase::Idle {
        print_json(&engine.snapshot(Utc::now()))?;
        return Ok(());
    }

    let timer_config = &ws.config.timer;
    let mut keep_awake: Option<KeepAwake> = None;
    let mut ticker = tokio::time::interval(timer_config.tick_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine = load_engine(&ws.db);
                let now = Utc::now();
                let elapsed = engine.tick(now);
                match engine.phase() {
                    TimerPhase::Idle => {
                        println!("{}", serde_json::to_string(&engine.snapshot(now))?);
                        break;
                    }
                    TimerPhase::Running
                        if timer_config.keep_awake
                            && !keep_awake.as_ref().is_some_and(KeepAwake::is_running) =>
                    {
                        let marker = data_dir()?.join("heartbeat");
                        keep_awake = Some(KeepAwake::start(
                            timer_config.heartbeat_interval(),
                            heartbeat_file(marker),
                        ));
                    }
                    TimerPhase::Paused => {
                        if let Some(heartbeat) = keep_awake.take() {
                            heartbeat.stop();
                        }
                    }
                    TimerPhase::Running => {}
                }
                println!(
                    "{}",
                    json!({
                        "phase": engine.phase(),
                        "task_name": engine.task_name(),
                        "elapsed_secs": elapsed,
                        "elapsed": format_hms(elapsed),
                    })
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
