//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time. They are never run by the server on startup.

use super::{CliError, connect};

/// Run the server migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let store = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations")
        .run(store.pool())
        .await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
