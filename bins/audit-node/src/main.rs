mod cmd;
mod config;
mod error;

use std::process::ExitCode;

use clap::Parser;

use config::{Cli, Commands};
use error::NodeError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match dispatch(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), NodeError> {
    match cli.command {
        Commands::Serve(args) => cmd::serve::run(args).await,
        Commands::Log(args) => cmd::client::log(args).await,
        Commands::Get(args) => cmd::client::get(args).await,
        Commands::Range(args) => cmd::client::range(args).await,
        Commands::Demo => cmd::demo::run().await,
    }
}
