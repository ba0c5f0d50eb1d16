use crate::demo::{run_demo, run_eligibility, run_view, DemoArgs, EligibilityArgs, ViewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use retreat_registry::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Retreat Registry",
    about = "Serve and query retreat registration pools and participant views",
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
    /// Check whether one participant belongs to a pool
    Eligibility(EligibilityArgs),
    /// Render a participant view as a text table
    View(ViewArgs),
    /// Walk through eligibility, views, accounting, and the change feed
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Registry snapshot (JSON) to serve instead of APP_SNAPSHOT_PATH
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Eligibility(args) => run_eligibility(args),
        Command::View(args) => run_view(args),
        Command::Demo(args) => run_demo(args),
    }
}
