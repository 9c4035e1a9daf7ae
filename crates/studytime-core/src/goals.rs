//! Goal progress over the session history.
//!
//! Pure functions: nothing here is persisted, everything is recomputed from
//! the sessions and the current instant on every query.
//!
//! Weeks start on Sunday at local midnight. "Local" is the offset carried by
//! the `now` argument.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::Goals;
use crate::session::Session;

/// Seconds studied on `today` (matched on the session's recorded date).
pub fn today_total(sessions: &[Session], today: NaiveDate) -> u64 {
    sessions
        .iter()
        .filter(|s| s.date == today)
        .map(|s| s.duration)
        .sum()
}

/// Seconds studied since the start of the current week.
pub fn week_total(sessions: &[Session], now: DateTime<FixedOffset>) -> u64 {
    let start = week_start(now);
    sessions
        .iter()
        .filter(|s| s.start_time >= start)
        .map(|s| s.duration)
        .sum()
}

/// Most recent Sunday 00:00 in `now`'s offset, as a UTC instant.
pub fn week_start(now: DateTime<FixedOffset>) -> DateTime<Utc> {
    let days_back = i64::from(now.weekday().num_days_from_sunday());
    let sunday = now.date_naive() - Duration::days(days_back);
    let midnight = sunday.and_hms_opt(0, 0, 0).unwrap_or_default();
    now.offset()
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Fraction of `goal` reached, capped at 1.0. A zero goal reports 0.0.
pub fn progress(total_secs: u64, goal_secs: u64) -> f64 {
    if goal_secs == 0 {
        return 0.0;
    }
    (total_secs as f64 / goal_secs as f64).min(1.0)
}

/// Consecutive days with at least one session, counting back from `today`.
/// A day without study yet today does not break a streak that ran until
/// yesterday.
pub fn streak_days(sessions: &[Session], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = sessions.iter().map(|s| s.date).collect();
    days.sort_unstable();
    days.dedup();

    let mut cursor = today;
    if days.binary_search(&cursor).is_err() {
        cursor -= Duration::days(1);
    }
    let mut streak = 0;
    while days.binary_search(&cursor).is_ok() {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub today_secs: u64,
    pub week_secs: u64,
    pub daily_goal_secs: u64,
    pub weekly_goal_secs: u64,
    pub daily_fraction: f64,
    pub weekly_fraction: f64,
}

impl GoalProgress {
    pub fn evaluate(sessions: &[Session], goals: Goals, now: DateTime<FixedOffset>) -> Self {
        let today_secs = today_total(sessions, now.date_naive());
        let week_secs = week_total(sessions, now);
        Self {
            today_secs,
            week_secs,
            daily_goal_secs: goals.daily_secs(),
            weekly_goal_secs: goals.weekly_secs(),
            daily_fraction: progress(today_secs, goals.daily_secs()),
            weekly_fraction: progress(week_secs, goals.weekly_secs()),
        }
    }

    pub fn daily_met(&self) -> bool {
        self.today_secs >= self.daily_goal_secs
    }

    pub fn weekly_met(&self) -> bool {
        self.week_secs >= self.weekly_goal_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn session(start: &str, duration: u64) -> Session {
        let start = at(start);
        Session {
            id: start.to_rfc3339(),
            user_id: "u1".into(),
            subject: "Math".into(),
            duration,
            start_time: start.with_timezone(&Utc),
            end_time: start.with_timezone(&Utc) + Duration::seconds(duration as i64),
            date: start.date_naive(),
        }
    }

    #[test]
    fn today_total_matches_date() {
        let sessions = vec![
            session("2024-03-06T09:00:00+00:00", 1_800),
            session("2024-03-06T14:00:00+00:00", 1_800),
            session("2024-03-05T09:00:00+00:00", 5_000),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(today_total(&sessions, today), 3_600);
        // Pure: same inputs, same answer.
        assert_eq!(today_total(&sessions, today), today_total(&sessions, today));
    }

    #[test]
    fn week_starts_sunday_midnight() {
        // Wednesday 2024-03-06 → week starts Sunday 2024-03-03.
        let now = at("2024-03-06T12:00:00+00:00");
        assert_eq!(week_start(now), at("2024-03-03T00:00:00+00:00"));

        // On a Sunday the week starts that same day.
        let sunday = at("2024-03-03T08:00:00+00:00");
        assert_eq!(week_start(sunday), at("2024-03-03T00:00:00+00:00"));
    }

    #[test]
    fn week_start_respects_offset() {
        let now = at("2024-03-06T12:00:00+09:00");
        assert_eq!(week_start(now), at("2024-03-02T15:00:00+00:00"));
    }

    #[test]
    fn week_total_includes_boundary() {
        let now = at("2024-03-06T12:00:00+00:00");
        let sessions = vec![
            session("2024-03-03T00:00:00+00:00", 600),
            session("2024-03-02T23:59:59+00:00", 10_000),
            session("2024-03-06T08:00:00+00:00", 900),
        ];
        assert_eq!(week_total(&sessions, now), 1_500);
        assert_eq!(week_total(&sessions, now), week_total(&sessions, now));
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(progress(3_600, 7_200), 0.5);
        assert_eq!(progress(10_000, 7_200), 1.0);
        assert_eq!(progress(100, 0), 0.0);
    }

    #[test]
    fn evaluate_half_of_daily_goal() {
        let now = at("2024-03-06T18:00:00+00:00");
        let sessions = vec![
            session("2024-03-06T09:00:00+00:00", 2_400),
            session("2024-03-06T11:00:00+00:00", 1_200),
        ];
        let report = GoalProgress::evaluate(&sessions, Goals::new(7_200, 36_000), now);
        assert_eq!(report.today_secs, 3_600);
        assert_eq!(report.daily_fraction, 0.5);
        assert_eq!(report.week_secs, 3_600);
        assert_eq!(report.weekly_fraction, 0.1);
        assert!(!report.daily_met());
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let sessions = vec![
            session("2024-03-06T09:00:00+00:00", 600),
            session("2024-03-05T09:00:00+00:00", 600),
            session("2024-03-05T19:00:00+00:00", 600),
            session("2024-03-04T09:00:00+00:00", 600),
            session("2024-03-01T09:00:00+00:00", 600),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(streak_days(&sessions, today), 3);

        // Nothing yet on the 7th: streak through yesterday still counts.
        let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(streak_days(&sessions, tomorrow), 3);

        let later = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(streak_days(&sessions, later), 0);
    }
}
