//! SQLite-backed persistence gateway.
//!
//! Provides persistent storage for:
//! - User profile documents (JSON, one row per user)
//! - Completed study sessions
//! - Key-value store for application state (the CLI's timer between runs)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::PersistenceError;
use crate::gateway::PersistenceGateway;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::session::{NewSession, Session};

use super::data_dir;

/// SQLite document store.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    /// Open the store at `<data_dir>/studytime.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unusable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, PersistenceError> {
        let dir = data_dir().map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("studytime.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|source| PersistenceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory store (tests, scratch runs).
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Unavailable("connection mutex poisoned".into()))
    }

    fn migrate(&self) -> Result<(), PersistenceError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS profiles (
                user_id   TEXT PRIMARY KEY,
                document  TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                subject     TEXT NOT NULL,
                duration    INTEGER NOT NULL,
                start_time  TEXT NOT NULL,
                end_time    TEXT NOT NULL,
                date        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_start ON sessions(user_id, start_time);",
        )?;
        Ok(())
    }

    fn read_profile(&self, user_id: &str) -> Result<Option<UserProfile>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT document FROM profiles WHERE user_id = ?1")?;
        let result = stmt.query_row(params![user_id], |row| row.get::<_, String>(0));
        let document = match result {
            Ok(doc) => doc,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&document)
            .map(Some)
            .map_err(|e| PersistenceError::CorruptDocument {
                key: user_id.to_string(),
                message: e.to_string(),
            })
    }

    fn write_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), PersistenceError> {
        let document = encode_profile(user_id, profile)?;
        self.conn()?.execute(
            "UPDATE profiles SET document = ?2 WHERE user_id = ?1",
            params![user_id, document],
        )?;
        Ok(())
    }

    fn insert_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), PersistenceError> {
        let document = encode_profile(user_id, profile)?;
        self.conn()?.execute(
            "INSERT OR IGNORE INTO profiles (user_id, document, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, document, fmt_instant(Utc::now())],
        )?;
        Ok(())
    }

    fn insert_session(&self, session: &NewSession) -> Result<String, PersistenceError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn()?.execute(
            "INSERT INTO sessions (id, user_id, subject, duration, start_time, end_time, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                session.user_id,
                session.subject,
                session.duration,
                fmt_instant(session.start_time),
                fmt_instant(session.end_time),
                session.date.format("%Y-%m-%d").to_string(),
            ],
        )?;
        Ok(id)
    }

    fn select_sessions(&self, user_id: &str, limit: usize) -> Result<Vec<Session>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, subject, duration, start_time, end_time, date
             FROM sessions
             WHERE user_id = ?1
             ORDER BY start_time DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, user_id, subject, duration, start, end, date) = row?;
            let corrupt = |message: String| PersistenceError::CorruptDocument {
                key: id.clone(),
                message,
            };
            let start_time = parse_instant(&start).map_err(corrupt)?;
            let end_time = parse_instant(&end).map_err(corrupt)?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| corrupt(e.to_string()))?;
            sessions.push(Session {
                id,
                user_id,
                subject,
                duration,
                start_time,
                end_time,
                date,
            });
        }
        Ok(sessions)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn get_user_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProfile>, PersistenceError> {
        self.read_profile(user_id)
    }

    async fn create_user_profile(
        &self,
        user_id: &str,
        defaults: &UserProfile,
    ) -> Result<(), PersistenceError> {
        self.insert_profile(user_id, defaults)
    }

    async fn update_user_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        let mut profile = self.read_profile(user_id)?.ok_or_else(|| {
            PersistenceError::QueryFailed(format!("no profile for user {user_id}"))
        })?;
        profile.apply(update);
        self.write_profile(user_id, &profile)
    }

    async fn append_session(&self, session: &NewSession) -> Result<String, PersistenceError> {
        self.insert_session(session)
    }

    async fn query_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>, PersistenceError> {
        self.select_sessions(user_id, limit)
    }
}

fn encode_profile(user_id: &str, profile: &UserProfile) -> Result<String, PersistenceError> {
    serde_json::to_string(profile).map_err(|e| PersistenceError::CorruptDocument {
        key: user_id.to_string(),
        message: e.to_string(),
    })
}

// Fixed-width UTC so that lexical order in SQL equals chronological order.
fn fmt_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}
