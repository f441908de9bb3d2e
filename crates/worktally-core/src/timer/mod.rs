mod engine;

pub use engine::{StopOutcome, TimerEngine, TimerPhase, TimerSnapshot};
