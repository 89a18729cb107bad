//! Rock Skimmer CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! rs-cli migrate
//!
//! # Create a login
//! rs-cli user create -e admin@example.com -p 'correct horse battery'
//!
//! # Grant or revoke moderation rights
//! rs-cli admin grant -e admin@example.com
//! rs-cli admin grant -e auditor@example.com -r viewer
//! rs-cli admin revoke -e auditor@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `ROCK_SKIMMER_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "Rock Skimmer CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage login accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage moderation roles
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new login
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant a role to an existing user
    Grant {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// Remove a user's role
    Revoke {
        /// User email address
        #[arg(short, long)]
        email: String,
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

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email, password } => {
                commands::user::create(&email, &password).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant { email, role } => commands::admin::grant(&email, &role).await?,
            AdminAction::Revoke { email } => commands::admin::revoke(&email).await?,
        },
    }
    Ok(())
}
