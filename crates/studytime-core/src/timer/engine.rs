//! Timer engine implementation.
//!
//! The timer engine is a stopwatch state machine counting whole seconds. It
//! does not own a thread: either a [`Ticker`](super::Ticker) drives `tick()`
//! once per second, or the caller samples the clock with `catch_up()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running
//!           |          |
//!           +-> Idle <-+   (stop / reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.select_subject(Some("Math".into()))?;
//! engine.start(Utc::now())?;
//! engine.tick(Utc::now()); // once per second
//! let run = engine.stop(Utc::now());
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

/// Upper bound on a single run: 12 hours.
pub const MAX_SESSION_SECONDS: u64 = 43_200;

/// Shortest run that is recorded as a session.
pub const MIN_SESSION_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Timing data handed to the session recorder when a run is stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoppedRun {
    pub subject: String,
    pub elapsed_secs: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl StoppedRun {
    /// Whether this run is long enough to become a session.
    pub fn is_recordable(&self) -> bool {
        self.elapsed_secs >= MIN_SESSION_SECONDS
    }
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    elapsed_secs: u64,
    active_subject: Option<String>,
    started_at: Option<DateTime<Utc>>,
    /// Instant up to which elapsed time has been accounted for.
    /// Only set while running.
    #[serde(default)]
    last_sample: Option<DateTime<Utc>>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_secs: 0,
            active_subject: None,
            started_at: None,
            last_sample: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn active_subject(&self) -> Option<&str> {
        self.active_subject.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            state: self.state,
            subject: self.active_subject.clone(),
            elapsed_secs: self.elapsed_secs,
            started_at: self.started_at,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change (or clear) the subject the next run is tracked against.
    pub fn select_subject(&mut self, subject: Option<String>) -> Result<(), ValidationError> {
        if self.state == TimerState::Running {
            return Err(ValidationError::SubjectLocked);
        }
        self.active_subject = subject.filter(|s| !s.trim().is_empty());
        Ok(())
    }

    /// Start from Idle or resume from Paused.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        let subject = self
            .active_subject
            .clone()
            .ok_or(ValidationError::NoSubjectSelected)?;

        match self.state {
            TimerState::Running => Err(ValidationError::AlreadyRunning),
            TimerState::Paused if self.elapsed_secs >= MAX_SESSION_SECONDS => {
                Err(ValidationError::MaxLengthReached)
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_sample = Some(now);
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
                Ok(Event::TimerResumed {
                    subject,
                    elapsed_secs: self.elapsed_secs,
                    at: now,
                })
            }
            TimerState::Idle => {
                self.state = TimerState::Running;
                self.elapsed_secs = 0;
                self.started_at = Some(now);
                self.last_sample = Some(now);
                Ok(Event::TimerStarted { subject, at: now })
            }
        }
    }

    /// Advance by one second. Returns `Some(Event::MaxLengthReached)` when
    /// this tick hit the cap and auto-paused the timer.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.elapsed_secs += 1;
        if let Some(last) = self.last_sample {
            self.last_sample = Some(last + Duration::seconds(1));
        }
        if self.elapsed_secs >= MAX_SESSION_SECONDS {
            self.elapsed_secs = MAX_SESSION_SECONDS;
            self.state = TimerState::Paused;
            self.last_sample = None;
            return Some(Event::MaxLengthReached {
                elapsed_secs: self.elapsed_secs,
                at: now,
            });
        }
        None
    }

    /// Account for wall-clock time since the last sample, one tick per
    /// whole second. Fractions carry over to the next sample.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let last = match (self.state, self.last_sample) {
            (TimerState::Running, Some(last)) => last,
            _ => return None,
        };
        let whole_secs = (now - last).num_seconds();
        if whole_secs <= 0 {
            return None;
        }
        let headroom = MAX_SESSION_SECONDS - self.elapsed_secs;
        let n = (whole_secs as u64).min(headroom);
        if n > 1 {
            // Bulk-apply all but the last tick; the last goes through tick()
            // so the cap logic lives in one place.
            self.elapsed_secs += n - 1;
            self.last_sample = Some(last + Duration::seconds((n - 1) as i64));
        }
        let event = self.tick(now);
        if self.state == TimerState::Running {
            self.last_sample = Some(last + Duration::seconds(whole_secs));
        }
        event
    }

    /// Re-anchor wall-clock sampling at `now` without crediting any time.
    /// Used when ticks do not arrive once per real second.
    pub fn resample(&mut self, now: DateTime<Utc>) {
        if self.state == TimerState::Running {
            self.last_sample = Some(now);
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        self.last_sample = None;
        Some(Event::TimerPaused {
            elapsed_secs: self.elapsed_secs,
            at: now,
        })
    }

    /// End the current run. The subject selection survives; timing is
    /// forgotten. `None` when there is no run to stop.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<StoppedRun> {
        if self.state == TimerState::Idle {
            return None;
        }
        let run = StoppedRun {
            subject: self.active_subject.clone().unwrap_or_default(),
            elapsed_secs: self.elapsed_secs,
            started_at: self.started_at.unwrap_or(now),
            ended_at: now,
        };
        self.clear_run();
        Some(run)
    }

    /// Discard any elapsed time without saving.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Event {
        let discarded_secs = self.elapsed_secs;
        self.clear_run();
        Event::TimerReset {
            discarded_secs,
            at: now,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn clear_run(&mut self) {
        self.state = TimerState::Idle;
        self.elapsed_secs = 0;
        self.started_at = None;
        self.last_sample = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-06T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn running(subject: &str) -> TimerEngine {
        let mut engine = TimerEngine::new();
        engine.select_subject(Some(subject.into())).unwrap();
        engine.start(t0()).unwrap();
        engine
    }

    #[test]
    fn start_without_subject_fails() {
        let mut engine = TimerEngine::new();
        assert_eq!(engine.start(t0()), Err(ValidationError::NoSubjectSelected));
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = running("Math");
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.started_at(), Some(t0()));

        engine.tick(t0());
        assert!(engine.pause(t0()).is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(engine.tick(t0()).is_none());
        assert_eq!(engine.elapsed_secs(), 1);

        let later = t0() + Duration::minutes(5);
        assert!(matches!(engine.start(later), Ok(Event::TimerResumed { elapsed_secs: 1, .. })));
        assert_eq!(engine.state(), TimerState::Running);
        // Resume keeps the original start instant.
        assert_eq!(engine.started_at(), Some(t0()));
    }

    #[test]
    fn start_while_running_fails() {
        let mut engine = running("Math");
        assert_eq!(engine.start(t0()), Err(ValidationError::AlreadyRunning));
    }

    #[test]
    fn subject_locked_while_running() {
        let mut engine = running("Math");
        assert_eq!(
            engine.select_subject(Some("Physics".into())),
            Err(ValidationError::SubjectLocked)
        );
        engine.pause(t0());
        assert!(engine.select_subject(Some("Physics".into())).is_ok());
        assert_eq!(engine.active_subject(), Some("Physics"));
    }

    #[test]
    fn pause_only_from_running() {
        let mut engine = TimerEngine::new();
        assert!(engine.pause(t0()).is_none());
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn stop_returns_run_and_resets() {
        let mut engine = running("Math");
        for _ in 0..65 {
            engine.tick(t0());
        }
        let end = t0() + Duration::seconds(65);
        let run = engine.stop(end).unwrap();
        assert_eq!(run.subject, "Math");
        assert_eq!(run.elapsed_secs, 65);
        assert_eq!(run.started_at, t0());
        assert_eq!(run.ended_at, end);
        assert!(run.is_recordable());

        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.elapsed_secs(), 0);
        assert_eq!(engine.active_subject(), Some("Math"));
    }

    #[test]
    fn short_run_is_not_recordable() {
        let mut engine = running("Math");
        for _ in 0..59 {
            engine.tick(t0());
        }
        let run = engine.stop(t0()).unwrap();
        assert!(!run.is_recordable());
        assert_eq!(engine.elapsed_secs(), 0);
    }

    #[test]
    fn stop_from_paused() {
        let mut engine = running("Math");
        for _ in 0..120 {
            engine.tick(t0());
        }
        engine.pause(t0());
        let run = engine.stop(t0()).unwrap();
        assert_eq!(run.elapsed_secs, 120);
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let mut engine = TimerEngine::new();
        assert!(engine.stop(t0()).is_none());
    }

    #[test]
    fn reset_discards_elapsed() {
        let mut engine = running("Math");
        for _ in 0..300 {
            engine.tick(t0());
        }
        match engine.reset(t0()) {
            Event::TimerReset { discarded_secs, .. } => assert_eq!(discarded_secs, 300),
            other => panic!("Expected TimerReset, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.elapsed_secs(), 0);
    }

    #[test]
    fn reaching_max_auto_pauses_once() {
        let mut engine = running("Math");
        let mut cap_events = 0;
        for _ in 0..(MAX_SESSION_SECONDS + 10) {
            if let Some(Event::MaxLengthReached { .. }) = engine.tick(t0()) {
                cap_events += 1;
            }
        }
        assert_eq!(cap_events, 1);
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.elapsed_secs(), MAX_SESSION_SECONDS);
        assert_eq!(engine.start(t0()), Err(ValidationError::MaxLengthReached));
    }

    #[test]
    fn catch_up_applies_whole_seconds() {
        let mut engine = running("Math");
        assert!(engine.catch_up(t0() + Duration::milliseconds(2_500)).is_none());
        assert_eq!(engine.elapsed_secs(), 2);
        // The half second carries over.
        engine.catch_up(t0() + Duration::milliseconds(3_100));
        assert_eq!(engine.elapsed_secs(), 3);
    }

    #[test]
    fn catch_up_clamps_at_max() {
        let mut engine = running("Math");
        let event = engine.catch_up(t0() + Duration::hours(13));
        assert!(matches!(event, Some(Event::MaxLengthReached { .. })));
        assert_eq!(engine.elapsed_secs(), MAX_SESSION_SECONDS);
        assert_eq!(engine.state(), TimerState::Paused);
    }

    #[test]
    fn catch_up_ignored_when_paused() {
        let mut engine = running("Math");
        engine.pause(t0());
        assert!(engine.catch_up(t0() + Duration::hours(1)).is_none());
        assert_eq!(engine.elapsed_secs(), 0);
    }

    #[test]
    fn events_carry_the_supplied_instant() {
        let mut engine = running("Math");
        let later = t0() + Duration::hours(2);
        match engine.snapshot(later) {
            Event::StateSnapshot { at, state, .. } => {
                assert_eq!(at, later);
                assert_eq!(state, TimerState::Running);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }

        let mut cap = None;
        for _ in 0..MAX_SESSION_SECONDS {
            cap = cap.or(engine.tick(later));
        }
        assert!(matches!(cap, Some(Event::MaxLengthReached { at, .. }) if at == later));
        assert!(matches!(engine.reset(later), Event::TimerReset { at, .. } if at == later));
    }

    #[test]
    fn resample_moves_anchor_without_credit() {
        let mut engine = running("Math");
        for _ in 0..3 {
            engine.tick(t0());
        }
        engine.resample(t0());
        engine.catch_up(t0() + Duration::seconds(5));
        assert_eq!(engine.elapsed_secs(), 8);

        engine.pause(t0());
        engine.resample(t0() + Duration::hours(1));
        assert!(engine.catch_up(t0() + Duration::hours(2)).is_none());
    }

    #[test]
    fn engine_survives_serialization() {
        let mut engine = running("Math");
        engine.tick(t0());
        let json = serde_json::to_string(&engine).unwrap();
        let restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), TimerState::Running);
        assert_eq!(restored.elapsed_secs(), 1);
        assert_eq!(restored.active_subject(), Some("Math"));
    }

    proptest! {
        #[test]
        fn ticks_add_exactly_one_until_cap(n in 0u64..50_000) {
            let mut engine = running("Math");
            for _ in 0..n {
                engine.tick(t0());
            }
            prop_assert_eq!(engine.elapsed_secs(), n.min(MAX_SESSION_SECONDS));
            let expected = if n >= MAX_SESSION_SECONDS { TimerState::Paused } else { TimerState::Running };
            prop_assert_eq!(engine.state(), expected);
        }
    }
}
