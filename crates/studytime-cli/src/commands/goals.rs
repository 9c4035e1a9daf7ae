use clap::Subcommand;
use serde::Serialize;
use studytime_core::format::format_duration;
use studytime_core::{GoalProgress, Goals};

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum GoalsAction {
    /// Show goals and today's / this week's progress
    Show,
    /// Change goals (values below 0.5h daily or 1h weekly are raised)
    Set {
        #[arg(long)]
        daily_hours: Option<f64>,
        #[arg(long)]
        weekly_hours: Option<f64>,
    },
}

#[derive(Serialize)]
struct GoalsReport {
    daily_goal: String,
    weekly_goal: String,
    daily_met: bool,
    weekly_met: bool,
    #[serde(flatten)]
    progress: GoalProgress,
}

pub async fn run(action: GoalsAction) -> CliResult {
    let mut ctx = Context::open().await?;
    match action {
        GoalsAction::Show => {
            ctx.done()?;
            let progress = ctx.tracker.goal_progress();
            print_json(&GoalsReport {
                daily_goal: format_duration(progress.daily_goal_secs),
                weekly_goal: format_duration(progress.weekly_goal_secs),
                daily_met: progress.daily_met(),
                weekly_met: progress.weekly_met(),
                progress,
            })?;
        }
        GoalsAction::Set {
            daily_hours,
            weekly_hours,
        } => {
            if daily_hours.is_none() && weekly_hours.is_none() {
                return Err("nothing to set: pass --daily-hours and/or --weekly-hours".into());
            }
            let current = ctx.tracker.goals();
            let goals = Goals::from_hours(
                daily_hours.unwrap_or(current.daily_secs() as f64 / 3600.0),
                weekly_hours.unwrap_or(current.weekly_secs() as f64 / 3600.0),
            );
            let result = ctx.tracker.set_goals(goals).await;
            let saved = ctx.finish(result)?;
            print_json(&saved)?;
        }
    }
    Ok(())
}
