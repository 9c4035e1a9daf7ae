//! Completed study sessions and the recorder that creates them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{PersistenceError, ValidationError};
use crate::gateway::PersistenceGateway;
use crate::timer::{StoppedRun, MIN_SESSION_SECONDS};

/// One persisted interval of study time. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    /// Seconds, at least [`MIN_SESSION_SECONDS`].
    pub duration: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Local calendar day the session was recorded on.
    pub date: NaiveDate,
}

/// A session before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub user_id: String,
    pub subject: String,
    pub duration: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub date: NaiveDate,
}

impl NewSession {
    pub fn with_id(self, id: String) -> Session {
        Session {
            id,
            user_id: self.user_id,
            subject: self.subject,
            duration: self.duration,
            start_time: self.start_time,
            end_time: self.end_time,
            date: self.date,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Turns stopped runs into sessions.
pub struct SessionRecorder {
    user_id: String,
    clock: Arc<dyn Clock>,
}

impl SessionRecorder {
    pub fn new(user_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_id: user_id.into(),
            clock,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Validate and stamp a new session. The calendar date comes from the
    /// clock at call time, not from `started_at`.
    pub fn prepare(
        &self,
        subject: &str,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<NewSession, ValidationError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::NoSubjectSelected);
        }
        if duration_secs < MIN_SESSION_SECONDS {
            return Err(ValidationError::SessionTooShort {
                secs: duration_secs,
                min_secs: MIN_SESSION_SECONDS,
            });
        }
        Ok(NewSession {
            user_id: self.user_id.clone(),
            subject: subject.to_string(),
            duration: duration_secs,
            start_time: started_at,
            end_time: ended_at,
            date: self.clock.today(),
        })
    }

    /// Persist a session through the gateway.
    pub async fn record(
        &self,
        gateway: &dyn PersistenceGateway,
        subject: &str,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<Session, RecordError> {
        let new_session = self.prepare(subject, duration_secs, started_at, ended_at)?;
        let id = gateway.append_session(&new_session).await?;
        tracing::info!(
            session_id = %id,
            subject = %new_session.subject,
            duration = new_session.duration,
            "session recorded"
        );
        Ok(new_session.with_id(id))
    }

    /// Offline variant: same validation, locally generated id, nothing stored.
    pub fn record_local(
        &self,
        subject: &str,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<Session, ValidationError> {
        let new_session = self.prepare(subject, duration_secs, started_at, ended_at)?;
        Ok(new_session.with_id(format!("local-{}", uuid::Uuid::new_v4())))
    }

    pub async fn record_run(
        &self,
        gateway: &dyn PersistenceGateway,
        run: &StoppedRun,
    ) -> Result<Session, RecordError> {
        self.record(gateway, &run.subject, run.elapsed_secs, run.started_at, run.ended_at)
            .await
    }
}
