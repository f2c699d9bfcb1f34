// ABOUTME: Entry point for the atlantis-deploy CLI application.
// ABOUTME: Parses arguments, sets up tracing, and dispatches to command handlers.

mod cli;
mod commands;

use std::env;

use atlantis_deploy::config::Settings;
use atlantis_deploy::error::{Error, Result};
use atlantis_deploy::lambda;
use atlantis_deploy::output::Output;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let output_mode = cli.output_mode();
    let result = run(cli).await;

    match result {
        Ok(()) => {}
        // Already reported in full by the command.
        Err(Error::PreflightFailed { .. } | Error::DeploymentFailed(_)) => std::process::exit(1),
        Err(e) => {
            Output::new(output_mode).error(&e.to_string());
            std::process::exit(if e.is_config() { 2 } else { 1 });
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
/// The Lambda runtime gets JSON logs for CloudWatch.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if matches!(cli.command, Commands::Lambda) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .without_time()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::discover_or_default(&env::current_dir()?),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let output = Output::new(cli.output_mode());

    match cli.command {
        Commands::Deploy(args) => commands::deploy(&settings, args, output).await,
        Commands::Preflight(args) => commands::preflight(&settings, args, output).await,
        Commands::Rollback(args) => commands::rollback(args, output).await,
        Commands::Lambda => lambda::run(settings).await,
    }
}
