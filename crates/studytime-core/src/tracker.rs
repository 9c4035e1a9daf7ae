//! The study tracker service object.
//!
//! [`StudyTracker`] is built once at startup with an injected gateway and
//! clock, and owns everything the UI talks to: the timer engine, its ticker,
//! cached profile/stats/history, and the queue of user notices.
//!
//! ## Consistency model
//!
//! Recording a session is two-phase. Stats are applied to the in-memory
//! cache first, then persisted, then the profile and history are re-read
//! from the store and overwrite the cache wholesale. The store is the source
//! of truth; the last fetch wins. Failures are reported and never rolled
//! back or retried.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::clock::Clock;
use crate::error::{CoreError, PersistenceError, Result, ValidationError};
use crate::events::{Event, Notice};
use crate::export;
use crate::format::format_duration;
use crate::gateway::{load_or_create_profile, PersistenceGateway, DEFAULT_SESSION_QUERY_LIMIT};
use crate::goals::{streak_days, GoalProgress};
use crate::profile::{Goals, ProfileUpdate, Theme, UserProfile};
use crate::session::{RecordError, Session, SessionRecorder};
use crate::stats::StatsBook;
use crate::storage::Config;
use crate::subjects::SubjectSet;
use crate::timer::{StoppedRun, Tick, Ticker, TimerEngine, TimerState};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub user_id: String,
    pub history_limit: usize,
    /// Goals written into a profile created on first use.
    pub default_goals: Goals,
    pub tick_period: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            user_id: "local".into(),
            history_limit: DEFAULT_SESSION_QUERY_LIMIT,
            default_goals: Goals::default(),
            tick_period: Duration::from_secs(1),
        }
    }
}

impl TrackerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_id: config.user.id.clone(),
            history_limit: config.history.limit,
            default_goals: config.default_goals(),
            tick_period: config.tick_period(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Online,
    /// Local-only: nothing is read from or written to a store.
    Offline,
}

/// What a stop did with the elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// Timer was idle.
    NotRunning,
    /// Under the minimum; time dropped.
    Discarded { elapsed_secs: u64 },
    Recorded { session: Session },
}

struct AttachedTicker {
    ticker: Ticker,
    sender: UnboundedSender<Tick>,
}

pub struct StudyTracker {
    gateway: Option<Arc<dyn PersistenceGateway>>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    recorder: SessionRecorder,
    engine: TimerEngine,
    subjects: SubjectSet,
    stats: StatsBook,
    profile: UserProfile,
    sessions: Vec<Session>,
    notices: Vec<Notice>,
    ticker: Option<AttachedTicker>,
}

impl StudyTracker {
    /// Load (or create) the user's profile and history. If the store cannot
    /// be reached the tracker comes up offline with a single notice.
    pub async fn initialize(
        gateway: Arc<dyn PersistenceGateway>,
        clock: Arc<dyn Clock>,
        settings: TrackerSettings,
    ) -> Self {
        let mut tracker = Self::offline(clock, settings);
        match tracker.load(gateway.as_ref()).await {
            Ok(()) => {
                tracker.gateway = Some(gateway);
                tracing::info!(
                    user_id = %tracker.settings.user_id,
                    sessions = tracker.sessions.len(),
                    "tracker initialized"
                );
            }
            Err(e) => {
                let err = CoreError::Initialization(e.to_string());
                tracing::warn!(error = %err, "store unavailable, running offline");
                tracker.notify(Notice::error(
                    "Could not reach storage; running offline and nothing will be saved",
                ));
            }
        }
        tracker
    }

    /// Local-only tracker with a fresh default profile.
    pub fn offline(clock: Arc<dyn Clock>, settings: TrackerSettings) -> Self {
        let recorder = SessionRecorder::new(settings.user_id.clone(), clock.clone());
        let profile = UserProfile::with_goals(settings.default_goals);
        Self {
            gateway: None,
            clock,
            recorder,
            engine: TimerEngine::new(),
            subjects: SubjectSet::default(),
            stats: StatsBook::default(),
            profile,
            sessions: Vec::new(),
            notices: Vec::new(),
            ticker: None,
            settings,
        }
    }

    async fn load(&mut self, gateway: &dyn PersistenceGateway) -> Result<(), PersistenceError> {
        let defaults = UserProfile::with_goals(self.settings.default_goals);
        let profile = load_or_create_profile(gateway, &self.settings.user_id, &defaults).await?;
        let sessions = gateway
            .query_sessions(&self.settings.user_id, self.settings.history_limit)
            .await?;
        self.install_profile(profile);
        self.sessions = sessions;
        Ok(())
    }

    fn install_profile(&mut self, profile: UserProfile) {
        self.subjects = SubjectSet::from_names(profile.subjects.iter().cloned());
        self.stats = StatsBook::from_parts(profile.total_study_time, profile.subject_stats.clone());
        self.profile = profile;

        let selected = self.engine.active_subject().map(str::to_string);
        if let Some(subject) = selected {
            if !self.subjects.contains(&subject) && self.engine.state() == TimerState::Idle {
                let _ = self.engine.select_subject(None);
            }
        }
    }

    /// Re-read profile and history from the store, overwriting the cache.
    pub async fn refresh(&mut self) -> Result<(), PersistenceError> {
        let Some(gateway) = self.gateway.clone() else {
            return Ok(());
        };
        let user_id = self.settings.user_id.clone();
        if let Some(profile) = gateway.get_user_profile(&user_id).await? {
            self.install_profile(profile);
        }
        self.sessions = gateway
            .query_sessions(&user_id, self.settings.history_limit)
            .await?;
        tracing::debug!(sessions = self.sessions.len(), "cache reconciled with store");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        if self.gateway.is_some() {
            Mode::Online
        } else {
            Mode::Offline
        }
    }

    pub fn user_id(&self) -> &str {
        &self.settings.user_id
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn subjects(&self) -> &SubjectSet {
        &self.subjects
    }

    pub fn stats(&self) -> &StatsBook {
        &self.stats
    }

    /// Cached history, newest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// History optionally narrowed to one subject.
    pub fn history(&self, subject: Option<&str>) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| subject.map_or(true, |name| s.subject == name))
            .collect()
    }

    /// Consecutive study days ending today or yesterday, from the cached
    /// history as of the clock's current date.
    pub fn streak(&self) -> u32 {
        streak_days(&self.sessions, self.clock.today())
    }

    /// Timer state stamped with the clock's current instant.
    pub fn snapshot(&self) -> Event {
        self.engine.snapshot(self.clock.now_utc())
    }

    pub fn goals(&self) -> Goals {
        self.profile.goals()
    }

    pub fn goal_progress(&self) -> GoalProgress {
        GoalProgress::evaluate(&self.sessions, self.goals(), self.clock.now())
    }

    /// Current profile document as the cache sees it.
    pub fn profile(&self) -> UserProfile {
        let (total_study_time, subject_stats) = self.stats.clone().into_parts();
        UserProfile {
            subjects: self.subjects.to_vec(),
            subject_stats,
            total_study_time,
            streak: self.streak(),
            ..self.profile.clone()
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Report a rejected action and hand the error back.
    fn rejected(&mut self, err: ValidationError) -> ValidationError {
        tracing::debug!(error = %err, "action rejected");
        self.notify(Notice::error(err.to_string()));
        err
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Continue a timer persisted by an earlier process.
    pub fn restore_engine(&mut self, engine: TimerEngine) {
        let orphaned = engine
            .active_subject()
            .is_some_and(|s| !self.subjects.contains(s));
        self.engine = engine;
        if orphaned {
            if self.engine.state() != TimerState::Idle {
                tracing::warn!("restored timer refers to a removed subject, discarding it");
                self.engine.reset(self.clock.now_utc());
                self.notify(Notice::error("Timer discarded: its subject no longer exists"));
            }
            let _ = self.engine.select_subject(None);
        }
        if self.engine.is_running() {
            self.start_ticker();
        }
    }

    /// Receive ticks once per period while the timer runs. Feed them back
    /// through [`on_tick`](Self::on_tick).
    pub fn attach_ticker(&mut self) -> UnboundedReceiver<Tick> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.ticker = Some(AttachedTicker {
            ticker: Ticker::new(self.settings.tick_period),
            sender,
        });
        if self.engine.is_running() {
            self.start_ticker();
        }
        receiver
    }

    fn start_ticker(&mut self) {
        if let Some(attached) = self.ticker.as_mut() {
            attached.ticker.start(attached.sender.clone());
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(attached) = self.ticker.as_mut() {
            attached.ticker.cancel();
        }
    }

    pub fn ticker_active(&self) -> bool {
        self.ticker.as_ref().is_some_and(|a| a.ticker.is_active())
    }

    /// Handle a tick from the attached ticker. Ticks from a cancelled
    /// generation are ignored.
    ///
    /// With a period other than one second each tick still counts as one
    /// second, and wall-clock sampling is re-anchored to the clock so a
    /// later [`catch_up`](Self::catch_up) only credits real time.
    pub fn on_tick(&mut self, tick: Tick) -> Option<Event> {
        let Some(attached) = self.ticker.as_ref() else {
            return None;
        };
        if attached.ticker.generation() != tick.generation || !attached.ticker.is_active() {
            return None;
        }
        let compressed = attached.ticker.period() != Duration::from_secs(1);
        let event = self.tick();
        if compressed {
            self.engine.resample(self.clock.now_utc());
        }
        event
    }

    /// Advance the running timer by one second.
    pub fn tick(&mut self) -> Option<Event> {
        let event = self.engine.tick(self.clock.now_utc());
        self.after_tick(event)
    }

    /// Sample the clock and account for all whole seconds since the last
    /// sample.
    pub fn catch_up(&mut self) -> Option<Event> {
        let event = self.engine.catch_up(self.clock.now_utc());
        self.after_tick(event)
    }

    fn after_tick(&mut self, event: Option<Event>) -> Option<Event> {
        if let Some(Event::MaxLengthReached { elapsed_secs, .. }) = &event {
            self.cancel_ticker();
            tracing::info!(elapsed_secs, "maximum session length reached, timer paused");
            self.notify(Notice::info(
                "Maximum session length (12 hours) reached. Timer paused.",
            ));
        }
        event
    }

    pub fn select_subject(&mut self, subject: Option<&str>) -> Result<(), ValidationError> {
        if let Some(name) = subject {
            if !self.subjects.contains(name) {
                return Err(self.rejected(ValidationError::UnknownSubject(name.to_string())));
            }
        }
        match self.engine.select_subject(subject.map(str::to_string)) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.rejected(e)),
        }
    }

    pub fn start(&mut self) -> Result<Event, ValidationError> {
        if let Some(subject) = self.engine.active_subject() {
            if !self.subjects.contains(subject) {
                let err = ValidationError::UnknownSubject(subject.to_string());
                return Err(self.rejected(err));
            }
        }
        let event = match self.engine.start(self.clock.now_utc()) {
            Ok(event) => event,
            Err(e) => return Err(self.rejected(e)),
        };
        self.start_ticker();
        if let Some(subject) = self.engine.active_subject() {
            let message = format!("Started studying {subject}");
            self.notify(Notice::success(message));
        }
        tracing::debug!(?event, "timer running");
        Ok(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause(self.clock.now_utc())?;
        self.cancel_ticker();
        self.notify(Notice::info("Timer paused"));
        Some(event)
    }

    /// Discard the current run without saving.
    pub fn reset(&mut self) -> Event {
        self.cancel_ticker();
        let event = self.engine.reset(self.clock.now_utc());
        self.notify(Notice::info("Timer reset"));
        event
    }

    /// Stop the timer and record the run if it is long enough.
    ///
    /// The timer is cleared before anything is persisted; a persistence
    /// failure loses the run and is reported as an error.
    pub async fn stop(&mut self) -> Result<StopOutcome> {
        let Some(run) = self.engine.stop(self.clock.now_utc()) else {
            return Ok(StopOutcome::NotRunning);
        };
        self.cancel_ticker();

        if !run.is_recordable() {
            tracing::debug!(elapsed_secs = run.elapsed_secs, "run too short, discarded");
            self.notify(Notice::info("Session must be at least 1 minute to save"));
            self.notify(Notice::success("Timer stopped"));
            return Ok(StopOutcome::Discarded {
                elapsed_secs: run.elapsed_secs,
            });
        }

        let session = self.record(&run).await?;
        self.notify(Notice::success("Timer stopped"));
        Ok(StopOutcome::Recorded { session })
    }

    async fn record(&mut self, run: &StoppedRun) -> Result<Session> {
        let session = match self.gateway.clone() {
            Some(gateway) => {
                let recorded = self.recorder.record_run(gateway.as_ref(), run).await;
                match recorded {
                    Ok(session) => session,
                    Err(RecordError::Validation(e)) => return Err(self.rejected(e).into()),
                    Err(RecordError::Persistence(e)) => {
                        tracing::warn!(error = %e, subject = %run.subject, "failed to save session");
                        self.notify(Notice::error("Failed to save session"));
                        return Err(e.into());
                    }
                }
            }
            None => match self.recorder.record_local(
                &run.subject,
                run.elapsed_secs,
                run.started_at,
                run.ended_at,
            ) {
                Ok(session) => session,
                Err(e) => return Err(self.rejected(e).into()),
            },
        };

        // Phase one: optimistic local apply.
        self.stats.apply(&session);
        self.sessions.insert(0, session.clone());
        self.profile.streak = self.streak();

        // Phase two: persist, then reconcile from the store.
        let (total, subject_stats) = self.stats.clone().into_parts();
        let update = ProfileUpdate {
            total_study_time: Some(total),
            subject_stats: Some(subject_stats),
            streak: Some(self.profile.streak),
            ..ProfileUpdate::default()
        };
        self.persist(update, "Failed to save session").await?;
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "failed to reload history after save");
            self.notify(Notice::error("Failed to load data"));
            return Err(e.into());
        }

        self.notify(Notice::success(format!(
            "Session saved: {} of {}",
            format_duration(session.duration),
            session.subject
        )));
        Ok(session)
    }

    /// Apply an update to the cached profile and write it through.
    async fn persist(&mut self, update: ProfileUpdate, failure: &str) -> Result<(), PersistenceError> {
        self.profile.apply(&update);
        let Some(gateway) = self.gateway.clone() else {
            return Ok(());
        };
        match gateway.update_user_profile(&self.settings.user_id, &update).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "profile update failed");
                self.notify(Notice::error(failure));
                Err(e)
            }
        }
    }

    // ── Subjects ─────────────────────────────────────────────────────

    pub async fn add_subject(&mut self, name: &str) -> Result<String> {
        let added = match self.subjects.add(name) {
            Ok(added) => added,
            Err(e) => return Err(self.rejected(e).into()),
        };
        self.persist(
            ProfileUpdate::subjects(self.subjects.to_vec()),
            "Failed to save subject",
        )
        .await?;
        self.notify(Notice::success("Subject added successfully!"));
        Ok(added)
    }

    /// Remove a subject. The subject of an unfinished run cannot be removed.
    pub async fn remove_subject(&mut self, name: &str) -> Result<bool> {
        let is_active = self.engine.active_subject() == Some(name);
        if is_active && self.engine.state() != TimerState::Idle {
            let err = ValidationError::SubjectInUse(name.to_string());
            return Err(self.rejected(err).into());
        }
        if !self.subjects.remove(name) {
            return Ok(false);
        }
        if is_active {
            let _ = self.engine.select_subject(None);
        }
        self.persist(
            ProfileUpdate::subjects(self.subjects.to_vec()),
            "Failed to remove subject",
        )
        .await?;
        self.notify(Notice::success("Subject removed"));
        Ok(true)
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub async fn set_goals(&mut self, goals: Goals) -> Result<Goals> {
        self.persist(ProfileUpdate::goals(goals), "Failed to save goals")
            .await?;
        self.notify(Notice::success("Goals updated successfully!"));
        Ok(goals)
    }

    pub async fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.profile.theme.toggled();
        let update = ProfileUpdate {
            theme: Some(theme),
            ..ProfileUpdate::default()
        };
        self.persist(update, "Failed to save theme").await?;
        Ok(theme)
    }

    pub async fn set_reminders(&mut self, enabled: bool) -> Result<bool> {
        let update = ProfileUpdate {
            reminders_enabled: Some(enabled),
            ..ProfileUpdate::default()
        };
        self.persist(update, "Failed to save reminders").await?;
        if enabled {
            self.notify(Notice::success("Reminders enabled!"));
        } else {
            self.notify(Notice::info("Reminders disabled"));
        }
        Ok(enabled)
    }

    // ── Export ───────────────────────────────────────────────────────

    pub fn export_csv<W: Write>(&mut self, writer: W) -> Result<usize> {
        match export::write_sessions_csv(writer, &self.sessions) {
            Ok(rows) => {
                self.notify(Notice::success("Data exported successfully!"));
                Ok(rows)
            }
            Err(CoreError::Validation(e)) => {
                self.notify(Notice::info(e.to_string()));
                Err(e.into())
            }
            Err(e) => {
                self.notify(Notice::error("Failed to export data"));
                Err(e)
            }
        }
    }
}
