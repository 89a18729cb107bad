//! Merchant application submission.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use rock_skimmer_core::{Email, Website};

use super::cache::ReadCache;
use crate::db::{RepositoryError, Store};
use crate::error::AppError;
use crate::models::{MerchantApplication, NewMerchantApplication, NewRock, Review, Rock};

/// Longest accepted business name.
const MAX_NAME_LENGTH: usize = 200;

const DUPLICATE_EMAIL: &str = "A merchant application with this email already exists";

/// Raw application form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub website: String,
}

impl ApplicationForm {
    /// Validate into a [`NewMerchantApplication`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the first bad field.
    pub fn validate(&self) -> Result<NewMerchantApplication, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("business name is required".to_owned()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "business name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        let email =
            Email::parse(&self.email).map_err(|e| AppError::Validation(e.to_string()))?;
        let website =
            Website::parse(&self.website).map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(NewMerchantApplication {
            name: name.to_owned(),
            email,
            website,
        })
    }
}

/// Everything created by a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedApplication {
    pub merchant: MerchantApplication,
    pub rock: Rock,
    pub review: Review,
}

/// Accepts new merchant applications.
pub struct OnboardingService<'a> {
    store: &'a dyn Store,
    cache: &'a ReadCache,
}

impl<'a> OnboardingService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, cache: &'a ReadCache) -> Self {
        Self { store, cache }
    }

    /// Create the merchant, its default rock (hidden), and its pending
    /// review, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input or a duplicate email.
    /// Returns `AppError::Database` if any insert fails; nothing is kept.
    #[instrument(skip(self, form))]
    pub async fn submit_application(
        &self,
        form: &ApplicationForm,
    ) -> Result<SubmittedApplication, AppError> {
        let new = form.validate()?;

        if self.store.find_merchant_by_email(&new.email).await?.is_some() {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_owned()));
        }

        let mut tx = self.store.begin().await?;
        let merchant = tx.insert_merchant(&new).await.map_err(|e| match e {
            // lost a race with a concurrent submission
            RepositoryError::Conflict(_) => AppError::Validation(DUPLICATE_EMAIL.to_owned()),
            other => AppError::Database(other),
        })?;
        let rock = tx.insert_rock(&NewRock::default_for(&merchant, false)).await?;
        let review = tx.insert_review(merchant.id, Some(rock.id)).await?;
        tx.commit().await?;
        self.cache.invalidate_all();

        info!(
            merchant_id = %merchant.id,
            review_id = %review.id,
            "Merchant application submitted"
        );

        Ok(SubmittedApplication {
            merchant,
            rock,
            review,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::{FailurePoint, MemoryStore};
    use rock_skimmer_core::ReviewStatus;

    fn form() -> ApplicationForm {
        ApplicationForm {
            name: " Rock Co ".to_owned(),
            email: "Sales@Rock.example".to_owned(),
            website: "https://rock.example".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_submit_creates_merchant_rock_and_review() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let submitted = OnboardingService::new(&store, &cache)
            .submit_application(&form())
            .await
            .unwrap();

        assert_eq!(submitted.merchant.name, "Rock Co");
        assert_eq!(submitted.merchant.email.as_str(), "sales@rock.example");
        assert!(!submitted.merchant.is_approved);
        assert_eq!(submitted.rock.name, "Rock Co's Default Rock");
        assert!(!submitted.rock.is_greenlisted);
        assert_eq!(submitted.review.status, ReviewStatus::Pending);
        assert_eq!(submitted.review.rock_id, Some(submitted.rock.id));
        assert_eq!(
            submitted.review.merchant_application_id,
            submitted.merchant.id
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let service = OnboardingService::new(&store, &cache);
        service.submit_application(&form()).await.unwrap();

        let mut again = form();
        again.email = "sales@rock.example".to_owned();
        let err = service.submit_application(&again).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == DUPLICATE_EMAIL));
        assert_eq!(store.list_merchants(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_fields_rejected() {
        let mut bad = form();
        bad.name = "   ".to_owned();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));

        let mut bad = form();
        bad.name = "x".repeat(201);
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));

        let mut bad = form();
        bad.email = "not-an-email".to_owned();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));

        let mut bad = form();
        bad.website = "rock.example".to_owned();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_review_insert_leaves_nothing() {
        let store = MemoryStore::new();
        store.fail_on(FailurePoint::InsertReview);
        let cache = ReadCache::new(Duration::from_secs(60));

        let err = OnboardingService::new(&store, &cache)
            .submit_application(&form())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(store.list_merchants(false).await.unwrap().is_empty());
        assert!(store.list_rocks(false).await.unwrap().is_empty());
    }
}
