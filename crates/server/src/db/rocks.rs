//! Catalog item queries.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use rock_skimmer_core::{MerchantId, RockId};

use super::RepositoryError;
use crate::models::{NewRock, Rock};

#[derive(Debug, sqlx::FromRow)]
struct RockRow {
    id: i32,
    name: String,
    description: String,
    image_url: String,
    is_greenlisted: bool,
    created_at: DateTime<Utc>,
    merchant_application_id: Option<i32>,
}

impl From<RockRow> for Rock {
    fn from(row: RockRow) -> Self {
        Self {
            id: RockId::new(row.id),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            is_greenlisted: row.is_greenlisted,
            created_at: row.created_at,
            merchant_application_id: row.merchant_application_id.map(MerchantId::new),
        }
    }
}

/// List catalog items, optionally only greenlisted ones.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list<'e, E: PgExecutor<'e>>(
    executor: E,
    greenlisted_only: bool,
) -> Result<Vec<Rock>, RepositoryError> {
    let rows = sqlx::query_as::<_, RockRow>(
        r"
        SELECT id, name, description, image_url, is_greenlisted, created_at,
               merchant_application_id
        FROM rock
        WHERE (NOT $1 OR is_greenlisted)
        ORDER BY created_at, id
        ",
    )
    .bind(greenlisted_only)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Rocks owned by a merchant.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn for_merchant<'e, E: PgExecutor<'e>>(
    executor: E,
    merchant: MerchantId,
) -> Result<Vec<Rock>, RepositoryError> {
    let rows = sqlx::query_as::<_, RockRow>(
        r"
        SELECT id, name, description, image_url, is_greenlisted, created_at,
               merchant_application_id
        FROM rock
        WHERE merchant_application_id = $1
        ORDER BY created_at, id
        ",
    )
    .bind(merchant)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Insert a catalog item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    new: &NewRock,
) -> Result<Rock, RepositoryError> {
    let row = sqlx::query_as::<_, RockRow>(
        r"
        INSERT INTO rock (name, description, image_url, is_greenlisted, merchant_application_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, description, image_url, is_greenlisted, created_at,
                  merchant_application_id
        ",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.image_url)
    .bind(new.is_greenlisted)
    .bind(new.merchant_application_id)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Set visibility on all of a merchant's rocks.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_greenlisted_for_merchant<'e, E: PgExecutor<'e>>(
    executor: E,
    merchant: MerchantId,
    greenlisted: bool,
) -> Result<Vec<Rock>, RepositoryError> {
    let mut rows = sqlx::query_as::<_, RockRow>(
        r"
        UPDATE rock
        SET is_greenlisted = $2
        WHERE merchant_application_id = $1
        RETURNING id, name, description, image_url, is_greenlisted, created_at,
                  merchant_application_id
        ",
    )
    .bind(merchant)
    .bind(greenlisted)
    .fetch_all(executor)
    .await?;

    // RETURNING has no ORDER BY
    rows.sort_by_key(|r| (r.created_at, r.id));
    Ok(rows.into_iter().map(Into::into).collect())
}
