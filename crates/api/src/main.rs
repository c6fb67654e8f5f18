//! koshflow - KoshFlow accounting API client
//!
//! Main entry point for the command-line application.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use koshflow_app::commands;
use koshflow_app::utils::logging::init_logging;
use koshflow_app::{AppContext, Cli};
use koshflow_infra::{config, ApiError};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so clap `env` fallbacks see its values
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_format) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) => debug!(error = %err, "No .env loaded"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(path) => config::load_from_file(Some(path)),
        None => config::load(),
    }
    .context("failed to load configuration")?;

    info!(base_url = %config.api.base_url, "koshflow starting");

    let ctx = AppContext::new(config).context("failed to initialize client")?;
    let output = commands::execute(&ctx, cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn report_error(err: &anyhow::Error) {
    eprintln!("error: {err:#}");

    if let Some(api_error) = err.downcast_ref::<ApiError>() {
        if let Some(code) = api_error.code() {
            eprintln!("  code: {code}");
        }
        for detail in api_error.details() {
            if detail.field.is_empty() {
                eprintln!("  - {}", detail.message);
            } else {
                eprintln!("  - {}: {}", detail.field, detail.message);
            }
        }
    }
}
