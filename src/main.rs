//! mongodb-lang command-line entry point
//!
//! Runs one analysis over a playground script and prints the result as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Completion context at line 1, character 3
//! mongodb-lang complete --line 1 --character 3 playground.mongodb.js
//!
//! # Read the script from stdin
//! cat playground.mongodb.js | mongodb-lang namespace --line 0 --character 0
//! ```

use tracing_subscriber::EnvFilter;

use mongodb_lang::cli::CliInterface;
use mongodb_lang::error::Result;

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Run the selected subcommand
fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.run()
}

/// Initialize logging system
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to
/// stderr.
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
