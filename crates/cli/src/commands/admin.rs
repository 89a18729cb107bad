//! Role management commands.
//!
//! The server checks the role table on every request, so changes here apply
//! to signed-in users immediately.

use rock_skimmer_core::{AdminRole, Email};
use rock_skimmer_server::db::Store;
use rock_skimmer_server::models::User;

use super::{CliError, connect};

async fn find_user(store: &dyn Store, email: &str) -> Result<User, CliError> {
    let parsed = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;
    store
        .find_user_by_email(&parsed)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_owned()))
}

/// Grant a role to an existing user, replacing any previous role.
///
/// # Errors
///
/// Returns an error for an unknown role or user, or a database failure.
pub async fn grant(email: &str, role: &str) -> Result<(), CliError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    let store = connect().await?;
    let user = find_user(&store, email).await?;
    store.grant_role(user.id, role).await?;

    tracing::info!("Granted role {} to {} (ID: {})", role, user.email, user.id);
    Ok(())
}

/// Remove a user's role.
///
/// # Errors
///
/// Returns an error for an unknown user or a database failure.
pub async fn revoke(email: &str) -> Result<(), CliError> {
    let store = connect().await?;
    let user = find_user(&store, email).await?;

    if store.revoke_role(user.id).await? {
        tracing::info!("Revoked role from {} (ID: {})", user.email, user.id);
    } else {
        tracing::warn!("{} had no role to revoke", user.email);
    }
    Ok(())
}

