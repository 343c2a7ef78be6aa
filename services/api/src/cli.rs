use crate::commands::{run_alerts, run_seed, AlertsArgs, SeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use doctrack::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "doctrack",
    about = "Track document expirations and serve renewal alerts",
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
    /// Create the schema and insert reference branches, types, and alert horizons
    Seed(SeedArgs),
    /// Print the renewal alerts for a category or reference month
    Alerts(AlertsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => run_seed(args),
        Command::Alerts(args) => run_alerts(args),
    }
}
