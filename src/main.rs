//! weftc - weft configuration inspector
//!
//! A small command-line tool for resolving, validating, and displaying
//! the configuration the weft framework would run with.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weft_config::cli::Cli;
use weft_config::error::Result;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug);

    // Execute the command
    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    info!("Starting weftc");
    cli.execute()
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "weft_config=debug"
    } else {
        "weft_config=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
