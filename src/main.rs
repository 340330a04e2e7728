use clap::Parser;
use colored::*;
use splace::cli::{Cli, Commands};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins, then SPLACE_LOG, then the -v level
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("SPLACE_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<splace::SplaceError>() {
            Some(splace::SplaceError::Config(_)) => 2,
            Some(splace::SplaceError::Io(_)) => 3,
            Some(splace::SplaceError::Parse(_)) => 4,
            Some(splace::SplaceError::Precondition(_)) => 5,
            Some(splace::SplaceError::EmptyStage(_)) => 6,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // 0 = one worker per CPU
    if let Err(e) = splace::utils::parallel::configure_thread_pool(0) {
        tracing::warn!("Failed to configure thread pool: {}", e);
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => splace::cli::commands::run::run(args, config_path),
        Commands::Supermatrix(args) => splace::cli::commands::supermatrix::run(args),
        Commands::Genes(args) => splace::cli::commands::genes::run(args, config_path),
        Commands::WriteConfig(args) => splace::cli::commands::write_config::run(args),
    }
}
