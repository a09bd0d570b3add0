use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use guildcfg::cli::{Cli, StdoutReplier, run};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli, &StdoutReplier).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "command finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
