use serde::Serialize;
use studytime_core::{GoalProgress, SubjectStat};

use crate::context::{print_json, CliResult, Context};

#[derive(Serialize)]
struct SubjectRow<'a> {
    subject: &'a str,
    #[serde(flatten)]
    stat: SubjectStat,
    average_session: u64,
}

#[derive(Serialize)]
struct StatsReport<'a> {
    total_study_time: u64,
    streak: u32,
    progress: GoalProgress,
    subjects: Vec<SubjectRow<'a>>,
}

/// Print aggregates, busiest subject first.
pub async fn run(subject: Option<String>) -> CliResult {
    let mut ctx = Context::open().await?;
    ctx.done()?;

    let tracker = &ctx.tracker;
    if let Some(name) = subject.as_deref() {
        if !tracker.subjects().contains(name) && tracker.stats().subject(name).is_none() {
            return Err(format!("no such subject: {name}").into());
        }
    }

    let subjects = tracker
        .stats()
        .ranked()
        .into_iter()
        .filter(|(name, _)| subject.as_deref().map_or(true, |s| s == *name))
        .map(|(name, stat)| SubjectRow {
            subject: name,
            stat: *stat,
            average_session: stat.average_session(),
        })
        .collect();

    print_json(&StatsReport {
        total_study_time: tracker.stats().total_study_time(),
        streak: tracker.streak(),
        progress: tracker.goal_progress(),
        subjects,
    })
}
