//! Per-subject aggregate statistics.
//!
//! [`StatsBook`] is folded forward one session at a time when a session is
//! recorded, and can be rebuilt from a full history when reconciling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubjectStat {
    /// Sum of session durations, seconds.
    pub total_time: u64,
    pub session_count: u64,
    /// Longest single session, seconds.
    pub highest_session: u64,
}

impl SubjectStat {
    pub fn record(&mut self, duration_secs: u64) {
        self.total_time += duration_secs;
        self.session_count += 1;
        self.highest_session = self.highest_session.max(duration_secs);
    }

    /// Mean session length, seconds. Zero when nothing is recorded.
    pub fn average_session(&self) -> u64 {
        if self.session_count == 0 {
            return 0;
        }
        self.total_time / self.session_count
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsBook {
    total_study_time: u64,
    subjects: BTreeMap<String, SubjectStat>,
}

impl StatsBook {
    /// Continue from previously persisted aggregates.
    pub fn from_parts(total_study_time: u64, subjects: BTreeMap<String, SubjectStat>) -> Self {
        Self {
            total_study_time,
            subjects,
        }
    }

    /// Recompute from scratch over a session history.
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        let mut book = Self::default();
        for session in sessions {
            book.apply(session);
        }
        book
    }

    /// Fold one recorded session into the aggregates.
    pub fn apply(&mut self, session: &Session) -> &SubjectStat {
        self.total_study_time += session.duration;
        let stat = self.subjects.entry(session.subject.clone()).or_default();
        stat.record(session.duration);
        stat
    }

    pub fn total_study_time(&self) -> u64 {
        self.total_study_time
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectStat> {
        self.subjects.get(name)
    }

    /// Stats ordered by subject name.
    pub fn subjects(&self) -> impl Iterator<Item = (&str, &SubjectStat)> {
        self.subjects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Subjects with the most total time first.
    pub fn ranked(&self) -> Vec<(&str, &SubjectStat)> {
        let mut ranked: Vec<_> = self.subjects().collect();
        ranked.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time).then(a.0.cmp(b.0)));
        ranked
    }

    pub fn into_parts(self) -> (u64, BTreeMap<String, SubjectStat>) {
        (self.total_study_time, self.subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn session(subject: &str, duration: u64) -> Session {
        let start = Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap();
        Session {
            id: format!("{subject}-{duration}"),
            user_id: "u1".into(),
            subject: subject.into(),
            duration,
            start_time: start,
            end_time: start + chrono::Duration::seconds(duration as i64),
            date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
        }
    }

    #[test]
    fn apply_initializes_missing_subject() {
        let mut book = StatsBook::default();
        let stat = *book.apply(&session("Math", 65));
        assert_eq!(
            stat,
            SubjectStat {
                total_time: 65,
                session_count: 1,
                highest_session: 65
            }
        );
        assert_eq!(book.total_study_time(), 65);
    }

    #[test]
    fn apply_continues_from_persisted_parts() {
        let mut existing = BTreeMap::new();
        existing.insert(
            "Math".to_string(),
            SubjectStat {
                total_time: 3_600,
                session_count: 2,
                highest_session: 2_400,
            },
        );
        let mut book = StatsBook::from_parts(5_000, existing);
        book.apply(&session("Math", 3_000));
        let math = book.subject("Math").unwrap();
        assert_eq!(math.total_time, 6_600);
        assert_eq!(math.session_count, 3);
        assert_eq!(math.highest_session, 3_000);
        assert_eq!(book.total_study_time(), 8_000);
    }

    #[test]
    fn ranked_orders_by_total_time() {
        let sessions = [session("Math", 100), session("Art", 500), session("Math", 100)];
        let book = StatsBook::from_sessions(&sessions);
        let names: Vec<_> = book.ranked().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Art", "Math"]);
        assert_eq!(book.subject("Math").unwrap().average_session(), 100);
    }

    proptest! {
        #[test]
        fn aggregates_match_history(durations in prop::collection::vec(60u64..43_200, 1..40)) {
            let sessions: Vec<_> = durations.iter().map(|d| session("S", *d)).collect();
            let book = StatsBook::from_sessions(&sessions);
            let stat = book.subject("S").unwrap();
            prop_assert_eq!(stat.total_time, durations.iter().sum::<u64>());
            prop_assert_eq!(stat.session_count, durations.len() as u64);
            prop_assert_eq!(stat.highest_session, *durations.iter().max().unwrap());
            prop_assert_eq!(book.total_study_time(), stat.total_time);
        }
    }
}
