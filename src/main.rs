use clap::Parser;
use precog_client::cli::{Cli, handle_command};
use precog_client::config::load_config;
use precog_client::logger::setup_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load config first to get log level
    let mut config = load_config(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}", e);
        std::process::exit(1);
    });
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    // Keep the guard alive so file logs are flushed
    let _guard = setup_logging(&config).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    tracing::debug!("Using API at {}", config.api_base_url());

    if let Err(e) = handle_command(cli, config).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
