//! Review record queries.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use rock_skimmer_core::{MerchantId, ReviewId, ReviewStatus, RockId};

use super::RepositoryError;
use super::merchants::MerchantRow;
use crate::models::{Review, ReviewWithMerchant};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    merchant_application_id: i32,
    rock_id: Option<i32>,
    status: ReviewStatus,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            merchant_application_id: MerchantId::new(row.merchant_application_id),
            rock_id: row.rock_id.map(RockId::new),
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Review joined with its merchant; merchant columns are prefixed `m_`.
#[derive(Debug, sqlx::FromRow)]
struct ReviewMerchantRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    m_id: i32,
    m_name: String,
    m_email: String,
    m_website: String,
    m_is_approved: bool,
    m_created_at: DateTime<Utc>,
}

impl TryFrom<ReviewMerchantRow> for ReviewWithMerchant {
    type Error = RepositoryError;

    fn try_from(row: ReviewMerchantRow) -> Result<Self, Self::Error> {
        let merchant = MerchantRow {
            id: row.m_id,
            name: row.m_name,
            email: row.m_email,
            website: row.m_website,
            is_approved: row.m_is_approved,
            created_at: row.m_created_at,
        }
        .try_into()?;

        Ok(Self {
            review: row.review.into(),
            merchant,
        })
    }
}

/// All reviews with their merchant, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a merchant row is invalid.
pub async fn list_with_merchant<'e, E: PgExecutor<'e>>(
    executor: E,
) -> Result<Vec<ReviewWithMerchant>, RepositoryError> {
    let rows = sqlx::query_as::<_, ReviewMerchantRow>(
        r"
        SELECT r.id, r.merchant_application_id, r.rock_id, r.status, r.notes,
               r.created_at, r.updated_at,
               m.id AS m_id, m.name AS m_name, m.email AS m_email,
               m.website AS m_website, m.is_approved AS m_is_approved,
               m.created_at AS m_created_at
        FROM merchant_review r
        JOIN merchant_application m ON m.id = r.merchant_application_id
        ORDER BY r.created_at DESC, r.id DESC
        ",
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Get a review by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get<'e, E: PgExecutor<'e>>(
    executor: E,
    id: ReviewId,
) -> Result<Option<Review>, RepositoryError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        r"
        SELECT id, merchant_application_id, rock_id, status, notes, created_at, updated_at
        FROM merchant_review
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Create the pending review for a new merchant.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the merchant already has a review.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    merchant: MerchantId,
    rock: Option<RockId>,
) -> Result<Review, RepositoryError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        r"
        INSERT INTO merchant_review (merchant_application_id, rock_id)
        VALUES ($1, $2)
        RETURNING id, merchant_application_id, rock_id, status, notes, created_at, updated_at
        ",
    )
    .bind(merchant)
    .bind(rock)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "merchant already has a review"))?;

    Ok(row.into())
}

/// Overwrite status and notes.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no review has this ID.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: ReviewId,
    status: ReviewStatus,
    notes: &str,
) -> Result<Review, RepositoryError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        r"
        UPDATE merchant_review
        SET status = $2, notes = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, merchant_application_id, rock_id, status, notes, created_at, updated_at
        ",
    )
    .bind(id)
    .bind(status)
    .bind(notes)
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}
