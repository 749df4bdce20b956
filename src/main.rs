//! Alpha Radar - multi-chain trending token monitor
//!
//! This is the main entry point. It parses the CLI, loads and validates
//! configuration, initializes tracing and runs the orchestrator until
//! shutdown.
//!
//! Exit codes: 0 clean shutdown, 1 startup configuration failure,
//! 2 irrecoverable runtime failure.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alpha_radar::config::LogConfig;
use alpha_radar::{AlphaRadar, AppConfig, AppError};

#[derive(Parser, Debug)]
#[command(
    name = "alpha-radar",
    about = "Multi-chain trending token monitor for real-time chat streams",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log alerts instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    init_tracing(&config.log, cli.debug);

    tracing::info!("Starting Alpha Radar v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        return ExitCode::from(1);
    }

    match AlphaRadar::new(config, cli.dry_run).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ (AppError::Config(_) | AppError::Storage(_))) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!(error = %e, "Irrecoverable runtime failure");
            ExitCode::from(2)
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(config: &LogConfig, debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else {
        config.level.to_lowercase()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
