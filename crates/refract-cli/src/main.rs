use anyhow::Context;
use clap::Parser;
use refract_config::RefractConfig;

mod cli;
mod commands;
mod scene;
mod stdio;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("rfx error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = RefractConfig::load().context("failed to load refract configuration")?;
    init_tracing(cli.quiet, cli.verbose, &config.log.level)?;

    match &cli.command {
        cli::Commands::Serve => commands::serve::handle(&config).await,
        cli::Commands::Call(args) => commands::call::handle(args, &config).await,
        cli::Commands::Schema(args) => commands::schema::handle(args, &config),
    }
}

/// Logs go to stderr; stdout carries JSON-RPC traffic only.
fn init_tracing(quiet: bool, verbose: bool, configured: &str) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        configured
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("REFRACT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
