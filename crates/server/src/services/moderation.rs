//! Review status changes and the approval cascade.
//!
//! Changing a review's status propagates to the merchant and its catalog:
//!
//! | target     | merchant `is_approved` | rocks `is_greenlisted`                    |
//! |------------|------------------------|-------------------------------------------|
//! | `approved` | `true`                 | `true` (default rock created if none)     |
//! | `pending`  | `false`                | `false`                                   |
//! | `rejected` | `false`                | `false`                                   |
//!
//! In [`CascadeMode::Strict`] every step shares one transaction. In
//! [`CascadeMode::BestEffort`] each step commits separately and merchant or
//! catalog failures come back as [`CascadeWarning`]s.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use rock_skimmer_core::{CascadeMode, MerchantId, ReviewId, ReviewStatus};

use super::cache::ReadCache;
use crate::db::{RepositoryError, Store, StoreTx};
use crate::error::AppError;
use crate::models::{MerchantApplication, NewRock, Review, Rock};

/// Longest accepted moderator note (after sanitising).
pub const MAX_NOTES_LENGTH: usize = 2000;

/// A step of the approval cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    UpdateMerchant,
    LoadRocks,
    CreateDefaultRock,
    UpdateRocks,
    UpdateReview,
    Commit,
}

impl std::fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UpdateMerchant => "update_merchant",
            Self::LoadRocks => "load_rocks",
            Self::CreateDefaultRock => "create_default_rock",
            Self::UpdateRocks => "update_rocks",
            Self::UpdateReview => "update_review",
            Self::Commit => "commit",
        })
    }
}

/// A best-effort step that failed without stopping the status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeWarning {
    pub step: CascadeStep,
    pub message: String,
}

/// Requested status change.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: ReviewStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// Overrides the configured cascade mode for this request.
    #[serde(default)]
    pub mode: Option<CascadeMode>,
}

/// Result of a status change.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeOutcome {
    pub review: Review,
    /// Merchant after the cascade; `None` if its step failed (best-effort).
    pub merchant: Option<MerchantApplication>,
    /// The merchant's rocks after the cascade; empty if their step failed.
    pub rocks: Vec<Rock>,
    pub mode: CascadeMode,
    pub warnings: Vec<CascadeWarning>,
}

/// Applies review status changes.
pub struct ModerationService<'a> {
    store: &'a dyn Store,
    cache: &'a ReadCache,
    default_mode: CascadeMode,
}

impl<'a> ModerationService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        cache: &'a ReadCache,
        default_mode: CascadeMode,
    ) -> Self {
        Self {
            store,
            cache,
            default_mode,
        }
    }

    /// Set a review's status and cascade it to the merchant and its rocks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the notes are too long.
    /// Returns `AppError::NotFound` if the review does not exist.
    /// Returns `AppError::Cascade` if a strict cascade fails (nothing applied).
    /// Returns `AppError::Database` if the review update itself fails.
    #[instrument(skip(self, change), fields(status = %change.status))]
    pub async fn set_review_status(
        &self,
        review_id: ReviewId,
        change: &StatusChange,
    ) -> Result<CascadeOutcome, AppError> {
        let notes = sanitize_notes(change.notes.as_deref().unwrap_or_default())?;
        let mode = change.mode.unwrap_or(self.default_mode);

        let outcome = match mode {
            CascadeMode::Strict => self.apply_strict(review_id, change.status, &notes).await,
            CascadeMode::BestEffort => {
                self.apply_best_effort(review_id, change.status, &notes)
                    .await
            }
        }?;

        info!(
            merchant_id = %outcome.review.merchant_application_id,
            mode = %mode,
            warnings = outcome.warnings.len(),
            "Review status changed"
        );
        Ok(outcome)
    }

    async fn apply_strict(
        &self,
        review_id: ReviewId,
        status: ReviewStatus,
        notes: &str,
    ) -> Result<CascadeOutcome, AppError> {
        let approved = status.is_approved();
        let mut tx = self.store.begin().await?;

        let review = tx
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {review_id}")))?;

        let merchant = tx
            .set_merchant_approved(review.merchant_application_id, approved)
            .await
            .map_err(|source| cascade_failed(CascadeStep::UpdateMerchant, source))?;

        let rocks = sync_catalog(tx.as_mut(), &merchant, approved)
            .await
            .map_err(|(step, source)| cascade_failed(step, source))?;

        let review = tx
            .update_review(review_id, status, notes)
            .await
            .map_err(|source| cascade_failed(CascadeStep::UpdateReview, source))?;

        tx.commit()
            .await
            .map_err(|source| cascade_failed(CascadeStep::Commit, source))?;
        self.cache.invalidate_all();

        Ok(CascadeOutcome {
            review,
            merchant: Some(merchant),
            rocks,
            mode: CascadeMode::Strict,
            warnings: Vec::new(),
        })
    }

    async fn apply_best_effort(
        &self,
        review_id: ReviewId,
        status: ReviewStatus,
        notes: &str,
    ) -> Result<CascadeOutcome, AppError> {
        let approved = status.is_approved();

        let review = {
            let mut tx = self.store.begin().await?;
            let review = tx.get_review(review_id).await?;
            tx.commit().await?;
            review.ok_or_else(|| AppError::NotFound(format!("review {review_id}")))?
        };
        let merchant_id = review.merchant_application_id;

        let mut warnings = Vec::new();

        let merchant = match self.merchant_step(merchant_id, approved).await {
            Ok(merchant) => Some(merchant),
            Err((step, source)) => {
                warnings.push(warn_step(merchant_id, step, &source));
                None
            }
        };

        let rocks = match self.catalog_step(merchant_id, approved).await {
            Ok(rocks) => rocks,
            Err((step, source)) => {
                warnings.push(warn_step(merchant_id, step, &source));
                Vec::new()
            }
        };

        let result = self.review_step(review_id, status, notes).await;
        // earlier steps may have committed even if this one failed
        self.cache.invalidate_all();

        let review = result.inspect_err(|e| {
            error!(
                review_id = %review_id,
                error = %e,
                warnings = warnings.len(),
                "Review update failed after best-effort cascade steps"
            );
        })?;

        Ok(CascadeOutcome {
            review,
            merchant,
            rocks,
            mode: CascadeMode::BestEffort,
            warnings,
        })
    }

    async fn merchant_step(
        &self,
        merchant_id: MerchantId,
        approved: bool,
    ) -> Result<MerchantApplication, (CascadeStep, RepositoryError)> {
        let step = |source| (CascadeStep::UpdateMerchant, source);
        let mut tx = self.store.begin().await.map_err(step)?;
        let merchant = tx
            .set_merchant_approved(merchant_id, approved)
            .await
            .map_err(step)?;
        tx.commit().await.map_err(|source| (CascadeStep::Commit, source))?;
        Ok(merchant)
    }

    async fn catalog_step(
        &self,
        merchant_id: MerchantId,
        approved: bool,
    ) -> Result<Vec<Rock>, (CascadeStep, RepositoryError)> {
        let step = |source| (CascadeStep::LoadRocks, source);
        let mut tx = self.store.begin().await.map_err(step)?;
        let merchant = tx
            .get_merchant(merchant_id)
            .await
            .map_err(step)?
            .ok_or((CascadeStep::LoadRocks, RepositoryError::NotFound))?;
        let rocks = sync_catalog(tx.as_mut(), &merchant, approved).await?;
        tx.commit().await.map_err(|source| (CascadeStep::Commit, source))?;
        Ok(rocks)
    }

    async fn review_step(
        &self,
        review_id: ReviewId,
        status: ReviewStatus,
        notes: &str,
    ) -> Result<Review, AppError> {
        let mut tx = self.store.begin().await?;
        let review = tx.update_review(review_id, status, notes).await?;
        tx.commit().await?;
        Ok(review)
    }
}

/// Bring the merchant's rocks in line with its approval.
async fn sync_catalog(
    tx: &mut dyn StoreTx,
    merchant: &MerchantApplication,
    approved: bool,
) -> Result<Vec<Rock>, (CascadeStep, RepositoryError)> {
    let existing = tx
        .rocks_for_merchant(merchant.id)
        .await
        .map_err(|source| (CascadeStep::LoadRocks, source))?;

    if approved && existing.is_empty() {
        let rock = tx
            .insert_rock(&NewRock::default_for(merchant, true))
            .await
            .map_err(|source| (CascadeStep::CreateDefaultRock, source))?;
        return Ok(vec![rock]);
    }

    tx.set_rocks_greenlisted(merchant.id, approved)
        .await
        .map_err(|source| (CascadeStep::UpdateRocks, source))
}

fn cascade_failed(step: CascadeStep, source: RepositoryError) -> AppError {
    warn!(step = %step, error = %source, "Strict cascade rolled back");
    AppError::Cascade { step, source }
}

fn warn_step(
    merchant_id: MerchantId,
    step: CascadeStep,
    source: &RepositoryError,
) -> CascadeWarning {
    warn!(
        merchant_id = %merchant_id,
        step = %step,
        error = %source,
        "Best-effort cascade step failed"
    );
    CascadeWarning {
        step,
        message: source.to_string(),
    }
}

/// Matches one `<...>` tag run. An unclosed `<` never matches.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Trim and strip tags from moderator notes.
///
/// # Errors
///
/// Returns `AppError::Validation` if the result exceeds [`MAX_NOTES_LENGTH`].
pub fn sanitize_notes(raw: &str) -> Result<String, AppError> {
    let out = TAG_RE.replace_all(raw.trim(), "").into_owned();

    if out.chars().count() > MAX_NOTES_LENGTH {
        return Err(AppError::Validation(format!(
            "notes must be at most {MAX_NOTES_LENGTH} characters"
        )));
    }
    Ok(out)
}
