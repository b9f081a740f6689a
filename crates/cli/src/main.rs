//! TrueSoul CLI - store provisioning and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Provision collections and write the sample catalog
//! truesoul seed
//!
//! # Preview what seeding would write, without touching the store
//! truesoul seed --dry-run
//!
//! # Grant or revoke the admin flag
//! truesoul admin grant -e owner@truesoul.shop
//! truesoul admin revoke -u some-uid
//! ```
//!
//! # Commands
//!
//! - `seed` - Provision collections and write the sample catalog
//! - `admin grant` / `admin revoke` - Toggle a user's admin flag

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "truesoul")]
#[command(author, version, about = "TrueSoul CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision collections and write the sample catalog
    Seed {
        /// Print what would be written without contacting the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin flag to a user
    Grant {
        /// User uid (as assigned by the identity provider)
        #[arg(short, long, conflicts_with = "email")]
        uid: Option<String>,

        /// User email address
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Revoke the admin flag from a user
    Revoke {
        /// User uid (as assigned by the identity provider)
        #[arg(short, long, conflicts_with = "email")]
        uid: Option<String>,

        /// User email address
        #[arg(short, long)]
        email: Option<String>,
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
        Commands::Seed { dry_run } => commands::seed::run(dry_run).await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { uid, email } => {
                commands::admin::set_admin(uid.as_deref(), email.as_deref(), true).await?;
            }
            AdminAction::Revoke { uid, email } => {
                commands::admin::set_admin(uid.as_deref(), email.as_deref(), false).await?;
            }
        },
    }
    Ok(())
}
