mod engine;
mod ticker;

pub use engine::{
    StoppedRun, TimerEngine, TimerState, MAX_SESSION_SECONDS, MIN_SESSION_SECONDS,
};
pub use ticker::{Tick, Ticker};
