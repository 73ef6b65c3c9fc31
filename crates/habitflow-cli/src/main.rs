mod cli;
mod commands;
mod completions;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn log_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("habitflow")
        .join("logs")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to a file so streamed replies on stdout stay clean
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "habitflow.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    let config = config::ClientConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Completions { shell } => {
            completions::print_completions(shell);
            Ok(())
        }
        Commands::Coach(args) => commands::coach::run(&config, args).await,
        Commands::Motivate(args) => commands::motivate::run(&config, args, cli.format).await,
        Commands::Stats(args) => commands::stats::run(args, cli.format),
    }
}
