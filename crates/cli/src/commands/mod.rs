//! Command implementations.

pub mod admin;
pub mod migrate;
pub mod user;

use rock_skimmer_server::db::{PgStore, RepositoryError};
use rock_skimmer_server::services::AuthError;
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Account creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, viewer")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user with that email.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

/// Read the database URL, preferring `ROCK_SKIMMER_DATABASE_URL`.
fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("ROCK_SKIMMER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("ROCK_SKIMMER_DATABASE_URL"))
}

/// Connect to the database and wrap the pool in a store.
async fn connect() -> Result<PgStore, CliError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    let pool = rock_skimmer_server::db::create_pool(&url).await?;
    Ok(PgStore::new(pool))
}
