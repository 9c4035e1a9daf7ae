use crate::context::{print_json, CliResult, Context};

/// Print cached sessions, newest first.
pub async fn run(subject: Option<String>) -> CliResult {
    let mut ctx = Context::open().await?;
    ctx.done()?;
    print_json(&ctx.tracker.history(subject.as_deref()))
}
