use std::process::ExitCode;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use targetscan::cli::Cli;
use targetscan::config::Config;
use targetscan::logfile::ResultLog;
use targetscan::output::Reporter;
use targetscan::pipeline;
use targetscan::scanner::NmapScanner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "targetscan=debug" } else { "targetscan=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;

    let log = ResultLog::open(&cli.log_file)
        .with_context(|| format!("failed to open log file {}", cli.log_file.display()))?;
    let mut reporter = Reporter::stdout(log);

    let scanner = NmapScanner::with_program(&cli.nmap);
    let deadline = Duration::from_secs(cli.timeout);

    match pipeline::run(&config, &scanner, &mut reporter, deadline).await {
        Ok(summary) => {
            tracing::debug!(?summary, "run finished");
            Ok(())
        }
        Err(e) => {
            if let Err(log_err) = reporter.fatal(&e.to_string()) {
                tracing::warn!(error = %log_err, "could not record failure in log file");
            }
            Err(e.into())
        }
    }
}
