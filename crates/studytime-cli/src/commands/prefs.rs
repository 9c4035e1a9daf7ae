use clap::{Subcommand, ValueEnum};

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Switch between dark and light theme
    Theme,
    /// Turn study reminders on or off
    Reminders { state: Toggle },
    /// Print the stored profile
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

pub async fn run(action: PrefsAction) -> CliResult {
    let mut ctx = Context::open().await?;
    match action {
        PrefsAction::Theme => {
            let result = ctx.tracker.toggle_theme().await;
            let theme = ctx.finish(result)?;
            print_json(&theme)?;
        }
        PrefsAction::Reminders { state } => {
            let result = ctx.tracker.set_reminders(matches!(state, Toggle::On)).await;
            ctx.finish(result)?;
        }
        PrefsAction::Show => {
            ctx.done()?;
            print_json(&ctx.tracker.profile())?;
        }
    }
    Ok(())
}
