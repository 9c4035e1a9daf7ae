use clap::Subcommand;
use serde::Serialize;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// Add a subject
    Add {
        /// Subject name (surrounding whitespace is trimmed)
        name: String,
    },
    /// Remove a subject
    Remove { name: String },
    /// List subjects as JSON
    List,
    /// Select the subject the timer will track
    Select { name: String },
    /// Clear the selected subject
    Clear,
}

#[derive(Serialize)]
struct SubjectList<'a> {
    subjects: Vec<&'a str>,
    selected: Option<&'a str>,
}

pub async fn run(action: SubjectAction) -> CliResult {
    let mut ctx = Context::open().await?;
    match action {
        SubjectAction::Add { name } => {
            let result = ctx.tracker.add_subject(&name).await;
            let added = ctx.finish(result)?;
            println!("{added}");
        }
        SubjectAction::Remove { name } => {
            let result = ctx.tracker.remove_subject(&name).await;
            if !ctx.finish(result)? {
                return Err(format!("no such subject: {name}").into());
            }
        }
        SubjectAction::List => {
            ctx.done()?;
            let engine = ctx.tracker.engine();
            print_json(&SubjectList {
                subjects: ctx.tracker.subjects().iter().collect(),
                selected: engine.active_subject(),
            })?;
        }
        SubjectAction::Select { name } => {
            let result = ctx.tracker.select_subject(Some(&name));
            ctx.finish(result)?;
        }
        SubjectAction::Clear => {
            let result = ctx.tracker.select_subject(None);
            ctx.finish(result)?;
        }
    }
    Ok(())
}
