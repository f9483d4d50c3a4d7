//! Orchard CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! orchard-cli migrate
//!
//! # Seed the catalog from the sample product feed
//! orchard-cli seed
//!
//! # Seed from a different feed
//! orchard-cli seed --source https://example.com/products.json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "orchard-cli")]
#[command(author, version, about = "Orchard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Replace the catalog with products from the sample feed
    Seed {
        /// Override the seed feed URL
        #[arg(short, long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orchard_cli=info,orchard_server=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await.map_err(|e| e.to_string()),
        Commands::Seed { source } => commands::seed::run(source.as_deref())
            .await
            .map_err(|e| e.to_string()),
    };

    if let Err(message) = result {
        tracing::error!("command failed: {message}");
        std::process::exit(1);
    }
}
