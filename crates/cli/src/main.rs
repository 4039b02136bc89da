//! Backoffice CLI - database migrations and category maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! bo-cli migrate
//!
//! # Report categories whose materialized path is stale
//! bo-cli categories rebuild-paths --dry-run
//!
//! # Rewrite every stale materialized path
//! bo-cli categories rebuild-paths
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `categories rebuild-paths` - Repair ancestor chains and levels

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bo-cli")]
#[command(author, version, about = "Backoffice CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Maintain the category tree
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Recompute ancestors and level for every category reachable from the roots
    RebuildPaths {
        /// Only report how many categories are stale
        #[arg(long)]
        dry_run: bool,
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
    match cli.command {
        Commands::Migrate => commands::migrate::admin().await?,
        Commands::Categories { action } => match action {
            CategoryAction::RebuildPaths { dry_run } => {
                commands::categories::rebuild_paths(dry_run).await?;
            }
        },
    }
    Ok(())
}
