//! Vitrine CLI - Store bootstrap and fixture tools.
//!
//! # Usage
//!
//! ```bash
//! # Create db.json with empty collections and the upload directory
//! vitrine-cli init
//!
//! # Load fixtures through the same validators the HTTP routes use
//! vitrine-cli seed fixtures.yaml
//! ```
//!
//! Paths default to the server's `VITRINE_*` environment configuration.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vitrine_server::config::ServerConfig;

mod commands;

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store file and upload directory
    Init {
        /// Store file (default: `VITRINE_DB_PATH` or db.json)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Upload directory (default: `VITRINE_UPLOAD_DIR` or public/images)
        #[arg(long)]
        upload_dir: Option<PathBuf>,
    },
    /// Insert products and users from a YAML fixtures file
    Seed {
        /// Fixtures file with `products` and `users` lists
        file: PathBuf,

        /// Store file (default: `VITRINE_DB_PATH` or db.json)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    match cli.command {
        Commands::Init { db, upload_dir } => {
            commands::init::run(
                &db.unwrap_or(config.db_path),
                &upload_dir.unwrap_or(config.upload_dir),
            )
            .await?;
        }
        Commands::Seed { file, db } => {
            commands::seed::run(&file, &db.unwrap_or(config.db_path)).await?;
        }
    }
    Ok(())
}
