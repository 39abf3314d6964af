use crate::demo::run_demo;
use crate::replay::{run_replay, run_stats, ReplayArgs, StatsArgs};
use clap::{Parser, Subcommand};
use hiring_pipeline::config::AppConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Hiring Pipeline",
    about = "Exercise the candidate pipeline transition engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the built-in movement scenarios against a seeded pipeline (default command)
    Demo,
    /// Replay the move commands of a JSON fixture and print every outcome
    Replay(ReplayArgs),
    /// Replay a JSON fixture and print one job's pipeline statistics as JSON
    Stats(StatsArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, "hiring pipeline cli starting");

    match cli.command.unwrap_or(Command::Demo) {
        Command::Demo => run_demo(&config).await,
        Command::Replay(args) => run_replay(args, &config).await,
        Command::Stats(args) => run_stats(args, &config).await,
    }
}
