use crate::seed::{run_seed, SeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use flowjob::error::AppError;

#[derive(Parser, Debug)]
#[command(name = "flowjob", about = "FlowJob job matching service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the marketplace API (runs when no subcommand is given)
    Serve(ServeArgs),
    /// Populate an in-memory marketplace with generated workers, businesses, jobs and swipes
    Seed(SeedArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Bind address, overriding APP_HOST
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Listen port, overriding APP_PORT
    #[arg(long, short)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    match Cli::parse().command {
        None => server::run(ServeArgs::default()).await,
        Some(Command::Serve(args)) => server::run(args).await,
        Some(Command::Seed(args)) => run_seed(args).await,
    }
}
