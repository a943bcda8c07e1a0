//! `shorty` binary: the HTTP server and the analytics worker.
//!
//! # Usage
//!
//! ```bash
//! # Serve redirects and the REST API
//! cargo run -- serve
//!
//! # Consume click events into the database
//! cargo run -- worker
//! ```
//!
//! Both commands read their configuration from the environment (and `.env`);
//! see [`shorty::config`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use shorty::{config, server, telemetry, worker};

/// URL shortener with asynchronous click analytics.
#[derive(Parser)]
#[command(name = "shorty")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (redirects, shortening API, analytics queries)
    Serve,

    /// Run the analytics worker until SIGINT/SIGTERM
    Worker,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    telemetry::init_tracing(&config.log_level, &config.log_format)?;
    config.print_summary();

    match cli.command {
        Commands::Serve => server::run(config).await,
        Commands::Worker => worker::run(config).await,
    }
}
