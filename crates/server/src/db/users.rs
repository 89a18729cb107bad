//! Login account and role queries.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use rock_skimmer_core::{AdminRole, Email, UserId};

use super::RepositoryError;
use crate::models::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Create a login account.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email is already registered.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn create<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &Email,
    password_hash: &str,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO app_user (email, password_hash)
        VALUES ($1, $2)
        RETURNING id, email, created_at
        ",
    )
    .bind(email)
    .bind(password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "email already registered"))?;

    row.try_into()
}

/// Find an account by email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &Email,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, email, created_at
        FROM app_user
        WHERE email = $1
        ",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Find an account and its password hash by email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_credentials<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &Email,
) -> Result<Option<(User, String)>, RepositoryError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        r"
        SELECT id, email, created_at, password_hash
        FROM app_user
        WHERE email = $1
        ",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    row.map(|r| -> Result<(User, String), RepositoryError> {
        Ok((r.user.try_into()?, r.password_hash))
    })
    .transpose()
}

/// Look up a user's role record.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn role_for<'e, E: PgExecutor<'e>>(
    executor: E,
    user: UserId,
) -> Result<Option<AdminRole>, RepositoryError> {
    let role = sqlx::query_scalar::<_, AdminRole>(
        r"
        SELECT role FROM admin_role WHERE user_id = $1
        ",
    )
    .bind(user)
    .fetch_optional(executor)
    .await?;

    Ok(role)
}

/// Insert or replace a user's role record.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn grant_role<'e, E: PgExecutor<'e>>(
    executor: E,
    user: UserId,
    role: AdminRole,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO admin_role (user_id, role)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
        ",
    )
    .bind(user)
    .bind(role)
    .execute(executor)
    .await?;

    Ok(())
}

/// Delete a user's role record.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn revoke_role<'e, E: PgExecutor<'e>>(
    executor: E,
    user: UserId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM admin_role WHERE user_id = $1")
        .bind(user)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
