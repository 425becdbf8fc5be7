//! staykey CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use staykey_cli::cli::{Cli, Command};
use staykey_cli::error::CliResult;
use staykey_core::tracing::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if cli.log_json {
        tracing_config = tracing_config.with_format(TracingOutputFormat::Json);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Decode { file, json, all } => staykey_cli::commands::decode::run(&file, json, all),
        Command::Sync { config, apartment } => {
            staykey_cli::commands::sync::run(&config, apartment.as_deref()).await
        }
    }
}
