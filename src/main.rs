//! Gallica Fetcher CLI application
//!
//! Command-line interface for downloading Gallica documents as PDF.
//! Exit status: 0 on success, 2 for invalid input or configuration,
//! 130 when interrupted, 1 for any other failure.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use gallica_fetcher::app::coordinator::wait_for_shutdown;
use gallica_fetcher::cli::{handle_fetch, Cli};
use gallica_fetcher::config::{AppConfig, LoggingConfig};
use gallica_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(()) => 0,
            Err(e) => {
                error!(category = e.category(), "{}", e);
                eprintln!("Error: {}", e);
                e.exit_code()
            }
        },
        signal = wait_for_shutdown() => {
            eprintln!("\nInterrupted. Rerun the same command to resume.");
            signal.exit_code()
        }
    };

    process::exit(code);
}

/// Main application logic
async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.global.config.as_deref()).await?;
    init_logging(&cli, &config.logging);

    info!("Gallica Fetcher v{} starting", env!("CARGO_PKG_VERSION"));
    handle_fetch(cli.fetch, config, cli.global.quiet).await
}

/// Initialize logging from the verbosity flags, falling back to the config file
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("gallica_fetcher={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
