//! Pet shop CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! petshop-cli migrate
//!
//! # Give a user back-office access
//! petshop-cli admin grant -u 0b7e7a52-5d0f-4a43-9a3e-0d7f3c1d2e4f -r viewer
//! petshop-cli admin revoke -u 0b7e7a52-5d0f-4a43-9a3e-0d7f3c1d2e4f
//!
//! # Load services and shipping bands
//! petshop-cli seed crates/cli/seed/catalog.yaml
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "petshop-cli")]
#[command(author, version, about = "Pet shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage back-office roles
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Upsert services and shipping bands from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant (or change) a user's role
    Grant {
        /// User id (`sub` claim of the auth provider)
        #[arg(short, long)]
        user: String,

        /// Role (`admin`, `viewer`)
        #[arg(short, long, default_value = "viewer")]
        role: String,
    },
    /// Remove a user's back-office access
    Revoke {
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { user, role } => commands::admin::grant(&user, &role).await?,
            AdminAction::Revoke { user } => commands::admin::revoke(&user).await?,
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
