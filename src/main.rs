//! memocache - persistent memoization cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use memocache::cli::{Cli, Commands};
use memocache::config::ConfigManager;
use memocache::error::CacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .dir_override(cli.dir);
    let config = config_manager.load().await?;

    // Logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("memocache=warn"),
        1 => EnvFilter::new("memocache=info"),
        _ => EnvFilter::new("memocache=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    debug!("Config loaded from {}", config_manager.path().display());

    match cli.command {
        Commands::Has(args) => memocache::cli::commands::has(args, &config).await,
        Commands::Get(args) => memocache::cli::commands::get(args, &config).await,
        Commands::Set(args) => memocache::cli::commands::set(args, &config).await,
        Commands::List(args) => memocache::cli::commands::list(args, &config).await,
        Commands::Config(args) => {
            memocache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
