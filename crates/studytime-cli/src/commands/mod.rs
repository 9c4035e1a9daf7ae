pub mod config;
pub mod export;
pub mod goals;
pub mod history;
pub mod prefs;
pub mod stats;
pub mod subject;
pub mod timer;
