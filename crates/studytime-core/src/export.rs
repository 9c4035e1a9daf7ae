//! CSV export of the session history.

use std::io::Write;

use crate::error::{Result, ValidationError};
use crate::session::Session;

const HEADER: [&str; 6] = [
    "Date",
    "Subject",
    "Duration (min)",
    "Duration (sec)",
    "Start Time",
    "End Time",
];

/// Write one row per session. Returns the number of rows written.
pub fn write_sessions_csv<W: Write>(writer: W, sessions: &[Session]) -> Result<usize> {
    if sessions.is_empty() {
        return Err(ValidationError::NothingToExport.into());
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for session in sessions {
        let minutes = (session.duration + 30) / 60;
        wtr.write_record([
            session.date.format("%Y-%m-%d").to_string(),
            session.subject.clone(),
            minutes.to_string(),
            session.duration.to_string(),
            session.start_time.to_rfc3339(),
            session.end_time.to_rfc3339(),
        ])?;
    }
    wtr.flush()?;
    Ok(sessions.len())
}

/// Default export file name for a given day.
pub fn export_file_name(today: chrono::NaiveDate) -> String {
    format!("study-sessions-{}.csv", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn session(subject: &str, duration: u64) -> Session {
        let start = Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap();
        Session {
            id: "s1".into(),
            user_id: "u1".into(),
            subject: subject.into(),
            duration,
            start_time: start,
            end_time: start + chrono::Duration::seconds(duration as i64),
            date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
        }
    }

    #[test]
    fn writes_header_and_rounded_minutes() {
        let mut out = Vec::new();
        let rows = write_sessions_csv(&mut out, &[session("Math", 89), session("Art, History", 90)]).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Date,Subject,Duration (min),Duration (sec),Start Time,End Time"
        );
        assert!(lines[1].starts_with("2024-03-06,Math,1,89,"));
        // Round half up, and quote embedded commas.
        assert!(lines[2].starts_with("2024-03-06,\"Art, History\",2,90,"));
    }

    #[test]
    fn empty_history_is_rejected() {
        let err = write_sessions_csv(Vec::new(), &[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NothingToExport)
        ));
    }

    struct BrokenPipe;

    impl std::io::Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_surfaces_as_io_error() {
        let err = write_sessions_csv(BrokenPipe, &[session("Math", 120)]).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)), "got {err:?}");
    }

    #[test]
    fn file_name_carries_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(export_file_name(day), "study-sessions-2024-03-06.csv");
    }
}
