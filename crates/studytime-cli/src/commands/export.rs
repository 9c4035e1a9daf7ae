use std::fs::File;
use std::io::BufWriter;

use studytime_core::export::export_file_name;

use crate::context::{CliResult, Context};

pub async fn run(output: Option<String>) -> CliResult {
    let mut ctx = Context::open().await?;
    let target = output.unwrap_or_else(|| export_file_name(chrono::Local::now().date_naive()));

    if target == "-" {
        let result = ctx.tracker.export_csv(std::io::stdout().lock());
        ctx.finish(result)?;
        return Ok(());
    }

    // Nothing to write: fail before creating an empty file.
    if ctx.tracker.sessions().is_empty() {
        let result = ctx.tracker.export_csv(std::io::sink());
        ctx.finish(result)?;
        return Ok(());
    }

    let file = File::create(&target)?;
    let result = ctx.tracker.export_csv(BufWriter::new(file));
    let rows = ctx.finish(result)?;
    println!("{target} ({rows} sessions)");
    Ok(())
}
