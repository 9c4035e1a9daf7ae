//! Per-invocation wiring: config, store, tracker and the persisted timer.

use std::fmt;
use std::sync::Arc;

use studytime_core::{
    Config, NoticeLevel, SqliteGateway, StudyTracker, SystemClock, TimerEngine, TrackerSettings,
};

const ENGINE_KEY: &str = "timer_engine";

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Error already shown to the user as a notice.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("already reported")
    }
}

impl std::error::Error for Reported {}

pub struct Context {
    pub tracker: StudyTracker,
    store: Option<Arc<SqliteGateway>>,
}

impl Context {
    /// Open the store, load the user's data and pick up any timer left
    /// running by a previous invocation.
    pub async fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let settings = TrackerSettings::from_config(&config);
        let clock = Arc::new(SystemClock);

        let (mut tracker, store) = match SqliteGateway::open() {
            Ok(db) => {
                let db = Arc::new(db);
                let tracker = StudyTracker::initialize(db.clone(), clock, settings).await;
                (tracker, Some(db))
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot open store");
                let mut tracker = StudyTracker::offline(clock, settings);
                tracker.take_notices();
                eprintln!("[error] Could not open storage; running offline and nothing will be saved");
                (tracker, None)
            }
        };

        if let Some(engine) = store.as_ref().and_then(|db| load_engine(db)) {
            tracker.restore_engine(engine);
            tracker.catch_up();
        }

        Ok(Self {
            tracker,
            store,
        })
    }

    /// Persist the timer, print queued notices, and fold the command result.
    pub fn finish<T, E>(&mut self, result: Result<T, E>) -> CliResult<T>
    where
        E: Into<Box<dyn std::error::Error>>,
    {
        self.save_engine()?;
        let notices = self.tracker.take_notices();
        let shown_error = notices.iter().any(|n| n.level == NoticeLevel::Error);
        for notice in notices {
            eprintln!("[{}] {}", notice_label(notice.level), notice.message);
        }
        match result {
            Ok(value) => Ok(value),
            Err(_) if shown_error => Err(Box::new(Reported)),
            Err(e) => Err(e.into()),
        }
    }

    /// [`finish`](Self::finish) for commands that cannot fail.
    pub fn done(&mut self) -> CliResult {
        self.finish(Ok::<(), Reported>(()))
    }

    fn save_engine(&self) -> CliResult {
        if let Some(db) = &self.store {
            let json = serde_json::to_string(self.tracker.engine())?;
            db.kv_set(ENGINE_KEY, &json)?;
        }
        Ok(())
    }
}

fn load_engine(db: &SqliteGateway) -> Option<TimerEngine> {
    let json = db.kv_get(ENGINE_KEY).ok()??;
    match serde_json::from_str::<TimerEngine>(&json) {
        Ok(engine) => Some(engine),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable saved timer");
            None
        }
    }
}

pub fn notice_label(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
