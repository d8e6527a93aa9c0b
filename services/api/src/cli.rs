use crate::commands::{run_predict, run_regions, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use displacement_predictor::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Displacement Predictor",
    about = "Serve and query the forced-displacement classifiers from the command line",
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
    /// Score a single profile and print the validated prediction as JSON
    Predict(PredictArgs),
    /// Print the department table with distances from Bogota
    Regions,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the directory holding the model artifacts
    #[arg(long)]
    pub(crate) artifacts: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        // The registry client blocks, so keep it off the runtime threads.
        Command::Predict(args) => tokio::task::spawn_blocking(move || run_predict(args))
            .await
            .map_err(|err| AppError::Internal(err.to_string()))?,
        Command::Regions => run_regions(),
    }
}
