//! Merchant application queries.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use rock_skimmer_core::{Email, MerchantId, Website};

use super::RepositoryError;
use crate::models::{MerchantApplication, NewMerchantApplication};

/// Internal row type for merchant application queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct MerchantRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub website: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MerchantRow> for MerchantApplication {
    type Error = RepositoryError;

    fn try_from(row: MerchantRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid merchant email in database: {e}"))
        })?;
        let website = Website::parse(&row.website).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid merchant website in database: {e}"))
        })?;

        Ok(Self {
            id: MerchantId::new(row.id),
            name: row.name,
            email,
            website,
            is_approved: row.is_approved,
            created_at: row.created_at,
        })
    }
}

/// List merchant applications, optionally only approved ones.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list<'e, E: PgExecutor<'e>>(
    executor: E,
    approved_only: bool,
) -> Result<Vec<MerchantApplication>, RepositoryError> {
    let rows = sqlx::query_as::<_, MerchantRow>(
        r"
        SELECT id, name, email, website, is_approved, created_at
        FROM merchant_application
        WHERE (NOT $1 OR is_approved)
        ORDER BY created_at, id
        ",
    )
    .bind(approved_only)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Find a merchant application by contact email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &Email,
) -> Result<Option<MerchantApplication>, RepositoryError> {
    let row = sqlx::query_as::<_, MerchantRow>(
        r"
        SELECT id, name, email, website, is_approved, created_at
        FROM merchant_application
        WHERE email = $1
        ",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Get a merchant application by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get<'e, E: PgExecutor<'e>>(
    executor: E,
    id: MerchantId,
) -> Result<Option<MerchantApplication>, RepositoryError> {
    let row = sqlx::query_as::<_, MerchantRow>(
        r"
        SELECT id, name, email, website, is_approved, created_at
        FROM merchant_application
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Get a merchant application and hold a share lock on its row.
///
/// Blocks while an approval change on the same merchant is uncommitted, and
/// blocks that change until this transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_share<'e, E: PgExecutor<'e>>(
    executor: E,
    id: MerchantId,
) -> Result<Option<MerchantApplication>, RepositoryError> {
    let row = sqlx::query_as::<_, MerchantRow>(
        r"
        SELECT id, name, email, website, is_approved, created_at
        FROM merchant_application
        WHERE id = $1
        FOR SHARE
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Insert a merchant application (not approved).
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email is already used.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    new: &NewMerchantApplication,
) -> Result<MerchantApplication, RepositoryError> {
    let row = sqlx::query_as::<_, MerchantRow>(
        r"
        INSERT INTO merchant_application (name, email, website)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, website, is_approved, created_at
        ",
    )
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.website)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "merchant email already exists"))?;

    row.try_into()
}

/// Set a merchant's approval flag.
///
/// The `UPDATE` holds the row lock until the surrounding transaction ends,
/// which serialises concurrent cascades for the same merchant.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no merchant has this ID.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_approved<'e, E: PgExecutor<'e>>(
    executor: E,
    id: MerchantId,
    approved: bool,
) -> Result<MerchantApplication, RepositoryError> {
    let row = sqlx::query_as::<_, MerchantRow>(
        r"
        UPDATE merchant_application
        SET is_approved = $2
        WHERE id = $1
        RETURNING id, name, email, website, is_approved, created_at
        ",
    )
    .bind(id)
    .bind(approved)
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}
