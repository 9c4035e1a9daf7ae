use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Timer state changes other than stop produce an Event; a stop is
/// reported as a `StopOutcome` instead.
/// The CLI prints them; the tracker turns some into notices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        subject: String,
        at: DateTime<Utc>,
    },
    TimerResumed {
        subject: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Elapsed time hit the session cap and the timer paused itself.
    MaxLengthReached {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        discarded_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        subject: Option<String>,
        elapsed_secs: u64,
        started_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}
