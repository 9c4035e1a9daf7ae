//! # studytime Core Library
//!
//! Core business logic for the studytime study tracker. The CLI is a thin
//! layer over the same library; nothing here depends on a particular UI.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A whole-second stopwatch state machine, driven by a
//!   cancellable [`Ticker`] or by sampling the [`Clock`]
//! - **Session Recorder**: Turns qualifying stopped runs into [`Session`]s
//! - **Stats**: Per-subject aggregates folded forward per session
//! - **Goals**: Pure today/this-week progress over the session history
//! - **Gateway**: The [`PersistenceGateway`] trait and its SQLite store
//!
//! ## Key Components
//!
//! - [`StudyTracker`]: Service object wiring all of the above together
//! - [`TimerEngine`]: Core timer state machine
//! - [`SqliteGateway`]: Profile and session persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod export;
pub mod format;
pub mod gateway;
pub mod goals;
pub mod profile;
pub mod session;
pub mod stats;
pub mod storage;
pub mod subjects;
pub mod timer;
pub mod tracker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, PersistenceError, ValidationError};
pub use events::{Event, Notice, NoticeLevel};
pub use gateway::PersistenceGateway;
pub use goals::GoalProgress;
pub use profile::{Goals, ProfileUpdate, Theme, UserProfile};
pub use session::{NewSession, Session, SessionRecorder};
pub use stats::{StatsBook, SubjectStat};
pub use storage::{Config, SqliteGateway};
pub use subjects::SubjectSet;
pub use timer::{
    StoppedRun, Tick, Ticker, TimerEngine, TimerState, MAX_SESSION_SECONDS, MIN_SESSION_SECONDS,
};
pub use tracker::{Mode, StopOutcome, StudyTracker, TrackerSettings};
