//! Login account commands.

use rock_skimmer_server::services::AuthService;

use super::{CliError, connect};

/// Create a login with an argon2-hashed password.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, or a taken email.
pub async fn create(email: &str, password: &str) -> Result<(), CliError> {
    let store = connect().await?;

    let user = AuthService::new(&store).register(email, password).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    tracing::info!("Grant moderation rights with: rs-cli admin grant -e {}", user.email);
    Ok(())
}
