mod cli;
mod initializers;

use clap::Parser;
use kvgate_common::Config;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    if cli.version {
        println!("kvgate {}", cli::VERSION_STRING);
        return;
    }

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config {}: {err}", cli.config);
            std::process::exit(1);
        }
    };

    initializers::init_tracing(&config);
    if cli.daemon {
        warn!("daemon flag accepted but ignored; run under a process supervisor");
    }

    let dispatcher = initializers::init_gateway(&config);

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to wait for shutdown signal");
    }
    info!("shutting down");
    dispatcher.shutdown();
}
