use crate::demo::{run_averages, run_demo, run_review, AveragesArgs, DemoArgs, ReviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use elecmate::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Elecmate Pricing Moderation",
    about = "Serve and inspect the community pricing moderation workflow",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect a submissions export without starting the server
    Pricing {
        #[command(subcommand)]
        command: PricingCommand,
    },
    /// Walk through approve, flag, and reject against a synthetic dataset
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PricingCommand {
    /// List submissions with their price verdicts
    Review(ReviewArgs),
    /// Print per-job-type averages over approved submissions
    Averages(AveragesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// CSV export used to seed the in-memory submission store
    #[arg(long)]
    pub(crate) seed_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Pricing {
            command: PricingCommand::Review(args),
        } => run_review(args),
        Command::Pricing {
            command: PricingCommand::Averages(args),
        } => run_averages(args),
        Command::Demo(args) => run_demo(args),
    }
}
