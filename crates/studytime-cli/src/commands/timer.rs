use clap::Subcommand;
use studytime_core::format::format_clock;
use studytime_core::{Event, TimerState};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::context::{notice_label, print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the timer for the selected subject (or resume it)
    Start {
        /// Select this subject first
        #[arg(long)]
        subject: Option<String>,
    },
    /// Pause the running timer
    Pause,
    /// Resume a paused timer
    Resume,
    /// Stop the timer and save the session if it is at least a minute long
    Stop,
    /// Discard the current run without saving
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground with a live display.
    ///
    /// Reads single-letter commands from stdin: p (pause), r (resume),
    /// s (stop), x (reset), q (quit, leaving the timer as is).
    Run {
        /// Select this subject first
        #[arg(long)]
        subject: Option<String>,
    },
}

pub async fn run(action: TimerAction) -> CliResult {
    let mut ctx = Context::open().await?;
    match action {
        TimerAction::Start { subject } => {
            let result = start(&mut ctx, subject.as_deref());
            let event = ctx.finish(result)?;
            print_json(&event)?;
        }
        TimerAction::Resume => {
            let result = ctx.tracker.start();
            let event = ctx.finish(result)?;
            print_json(&event)?;
        }
        TimerAction::Pause => {
            let event = ctx.tracker.pause();
            ctx.done()?;
            print_json(&event.unwrap_or_else(|| ctx.tracker.snapshot()))?;
        }
        TimerAction::Stop => {
            let result = ctx.tracker.stop().await;
            let outcome = ctx.finish(result)?;
            print_json(&outcome)?;
        }
        TimerAction::Reset => {
            let event = ctx.tracker.reset();
            ctx.done()?;
            print_json(&event)?;
        }
        TimerAction::Status => {
            let snapshot = ctx.tracker.snapshot();
            ctx.done()?;
            print_json(&snapshot)?;
        }
        TimerAction::Run { subject } => {
            if let Some(name) = subject.as_deref() {
                let result = ctx.tracker.select_subject(Some(name));
                ctx.finish(result)?;
            }
            let result = foreground(&mut ctx).await;
            ctx.finish(result)?;
        }
    }
    Ok(())
}

fn start(ctx: &mut Context, subject: Option<&str>) -> Result<Event, studytime_core::ValidationError> {
    if let Some(name) = subject {
        ctx.tracker.select_subject(Some(name))?;
    }
    ctx.tracker.start()
}

async fn foreground(ctx: &mut Context) -> CliResult {
    let mut ticks = ctx.tracker.attach_ticker();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stderr = tokio::io::stderr();

    if !ctx.tracker.engine().is_running() {
        let event = ctx.tracker.start()?;
        emit(&event)?;
    }
    flush_notices(ctx);
    redraw(ctx, &mut stderr).await?;

    // With stdin closed nothing can resume the timer, so leave as soon as
    // it stops running.
    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if let Some(event) = ctx.tracker.on_tick(tick) {
                    emit(&event)?;
                    flush_notices(ctx);
                }
                redraw(ctx, &mut stderr).await?;
                if !stdin_open && !ctx.tracker.engine().is_running() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let command = match line? {
                    Some(line) => line,
                    None if ctx.tracker.engine().is_running() => {
                        stdin_open = false;
                        continue;
                    }
                    None => break,
                };
                match command.trim() {
                    "p" => {
                        if let Some(event) = ctx.tracker.pause() {
                            emit(&event)?;
                        }
                    }
                    "r" => {
                        if let Ok(event) = ctx.tracker.start() {
                            emit(&event)?;
                        }
                    }
                    "s" => {
                        let outcome = ctx.tracker.stop().await?;
                        println!("{}", serde_json::to_string(&outcome)?);
                        break;
                    }
                    "x" => {
                        emit(&ctx.tracker.reset())?;
                        break;
                    }
                    "q" => break,
                    "" => {}
                    other => eprintln!("\nunknown command: {other} (p, r, s, x, q)"),
                }
                flush_notices(ctx);
                redraw(ctx, &mut stderr).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, leaving timer in place");
                break;
            }
        }
    }
    stderr.write_all(b"\n").await?;
    Ok(())
}

fn emit(event: &Event) -> CliResult {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn flush_notices(ctx: &mut Context) {
    for notice in ctx.tracker.take_notices() {
        eprintln!("\n[{}] {}", notice_label(notice.level), notice.message);
    }
}

async fn redraw(ctx: &Context, stderr: &mut tokio::io::Stderr) -> CliResult {
    let engine = ctx.tracker.engine();
    let state = match engine.state() {
        TimerState::Idle => "idle",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
    };
    let line = format!(
        "\r{} {} [{}]   ",
        format_clock(engine.elapsed_secs()),
        engine.active_subject().unwrap_or("-"),
        state
    );
    stderr.write_all(line.as_bytes()).await?;
    stderr.flush().await?;
    Ok(())
}
