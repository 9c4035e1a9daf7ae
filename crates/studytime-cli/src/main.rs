use clap::{Parser, Subcommand};

mod commands;
mod context;
mod logging;

#[derive(Parser)]
#[command(name = "studytime", version, about = "Study time tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Subject management
    Subject {
        #[command(subcommand)]
        action: commands::subject::SubjectAction,
    },
    /// Study statistics and goal progress
    Stats {
        /// Only show this subject
        #[arg(long)]
        subject: Option<String>,
    },
    /// Daily and weekly goals
    Goals {
        #[command(subcommand)]
        action: commands::goals::GoalsAction,
    },
    /// Recent sessions
    History {
        /// Only show this subject
        #[arg(long)]
        subject: Option<String>,
    },
    /// Export recent sessions as CSV
    Export {
        /// Output file (defaults to study-sessions-<date>.csv; "-" for stdout)
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Profile preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action).await,
        Commands::Subject { action } => commands::subject::run(action).await,
        Commands::Stats { subject } => commands::stats::run(subject).await,
        Commands::Goals { action } => commands::goals::run(action).await,
        Commands::History { subject } => commands::history::run(subject).await,
        Commands::Export { output } => commands::export::run(output).await,
        Commands::Prefs { action } => commands::prefs::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        if !e.is::<context::Reported>() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}
