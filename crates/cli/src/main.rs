//! `nomad-volume` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — `NOMAD_*` environment variables overlaid with
//!    command-line flags (see [`args`]).
//! 2. **Wire observability** — `tracing-subscriber` with a pretty or JSON
//!    layer and an optional OpenTelemetry OTLP exporter (see [`telemetry`]).
//! 3. **Construct infrastructure** — a [`transport::HttpRequester`] injected
//!    into a [`client::VolumeClient`].
//! 4. **Run the subcommand** and print its JSON result to stdout.

mod args;
mod commands;
mod telemetry;

use std::process::ExitCode;

use clap::Parser;
use client::VolumeClient;
use tracing::error;

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.log_format, cli.otlp_endpoint.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = execute(cli).await;
    let code = match outcome {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn execute(cli: Cli) -> anyhow::Result<String> {
    let client = VolumeClient::new(commands::requester(&cli.connection)?);
    let value = commands::run(&client, cli.command).await?;
    Ok(serde_json::to_string_pretty(&value)?)
}
