//! Catalog and merchant listings, plus admin catalog edits.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};

use rock_skimmer_core::{MerchantId, ReviewId, Website};

use super::cache::{ReadCache, ReadKey, ReadValue};
use crate::db::Store;
use crate::error::AppError;
use crate::models::{MerchantApplication, NewRock, ReviewDetail, ReviewWithMerchant, Rock};

/// Longest accepted rock name.
const MAX_ROCK_NAME: usize = 200;

/// Longest accepted rock description.
const MAX_ROCK_DESCRIPTION: usize = 2000;

/// Admin input for adding a rock to a merchant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RockForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

/// Read and edit access to rocks and merchants.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
    cache: &'a ReadCache,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, cache: &'a ReadCache) -> Self {
        Self { store, cache }
    }

    /// Catalog items, optionally only the publicly visible ones.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store read fails.
    pub async fn rocks(&self, greenlisted_only: bool) -> Result<Arc<Vec<Rock>>, AppError> {
        let key = ReadKey::Rocks { greenlisted_only };
        if let Some(ReadValue::Rocks(rocks)) = self.cache.get(key).await {
            return Ok(rocks);
        }

        let seen = self.cache.generation();
        let rocks = Arc::new(self.store.list_rocks(greenlisted_only).await?);
        self.cache
            .insert(seen, key, ReadValue::Rocks(Arc::clone(&rocks)))
            .await;
        Ok(rocks)
    }

    /// Merchant applications, optionally only approved ones.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store read fails.
    pub async fn merchants(
        &self,
        approved_only: bool,
    ) -> Result<Arc<Vec<MerchantApplication>>, AppError> {
        let key = ReadKey::Merchants { approved_only };
        if let Some(ReadValue::Merchants(merchants)) = self.cache.get(key).await {
            return Ok(merchants);
        }

        let seen = self.cache.generation();
        let merchants = Arc::new(self.store.list_merchants(approved_only).await?);
        self.cache
            .insert(seen, key, ReadValue::Merchants(Arc::clone(&merchants)))
            .await;
        Ok(merchants)
    }

    /// Every review with its merchant, newest first (admin table).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store read fails.
    pub async fn reviews(&self) -> Result<Arc<Vec<ReviewWithMerchant>>, AppError> {
        if let Some(ReadValue::Reviews(reviews)) = self.cache.get(ReadKey::Reviews).await {
            return Ok(reviews);
        }

        let seen = self.cache.generation();
        let reviews = Arc::new(self.store.list_reviews().await?);
        self.cache
            .insert(seen, ReadKey::Reviews, ReadValue::Reviews(Arc::clone(&reviews)))
            .await;
        Ok(reviews)
    }

    /// One application with its merchant and rocks. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown review.
    /// Returns `AppError::Database` if the store read fails.
    pub async fn review_detail(&self, id: ReviewId) -> Result<ReviewDetail, AppError> {
        let mut tx = self.store.begin().await?;
        let review = tx
            .get_review(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {id}")))?;
        let merchant = tx
            .get_merchant(review.merchant_application_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("merchant {}", review.merchant_application_id))
            })?;
        let rocks = tx.rocks_for_merchant(merchant.id).await?;
        tx.commit().await?;

        Ok(ReviewDetail {
            review,
            merchant,
            rocks,
        })
    }

    /// Add a rock to a merchant. Its visibility mirrors the merchant's
    /// current approval.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input.
    /// Returns `AppError::NotFound` for an unknown merchant.
    /// Returns `AppError::Database` if the store write fails.
    #[instrument(skip(self, form), fields(merchant_id = %merchant_id))]
    pub async fn add_rock(
        &self,
        merchant_id: MerchantId,
        form: &RockForm,
    ) -> Result<Rock, AppError> {
        let (name, description, image_url) = validate_rock_form(form)?;

        let mut tx = self.store.begin().await?;
        let merchant = tx
            .lock_merchant(merchant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("merchant {merchant_id}")))?;
        let rock = tx
            .insert_rock(&NewRock {
                name,
                description,
                image_url,
                is_greenlisted: merchant.is_approved,
                merchant_application_id: Some(merchant.id),
            })
            .await?;
        tx.commit().await?;
        self.cache.invalidate_all();

        info!(rock_id = %rock.id, is_greenlisted = rock.is_greenlisted, "Rock added");
        Ok(rock)
    }
}

fn validate_rock_form(form: &RockForm) -> Result<(String, String, String), AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("rock name is required".to_owned()));
    }
    if name.chars().count() > MAX_ROCK_NAME {
        return Err(AppError::Validation(format!(
            "rock name must be at most {MAX_ROCK_NAME} characters"
        )));
    }

    let description = form.description.trim();
    if description.chars().count() > MAX_ROCK_DESCRIPTION {
        return Err(AppError::Validation(format!(
            "description must be at most {MAX_ROCK_DESCRIPTION} characters"
        )));
    }

    let image_url = form.image_url.trim();
    if !image_url.is_empty() {
        Website::parse(image_url)
            .map_err(|e| AppError::Validation(format!("image url: {e}")))?;
    }

    Ok((name.to_owned(), description.to_owned(), image_url.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::{FailurePoint, MemoryStore};
    use crate::services::onboarding::{ApplicationForm, OnboardingService};

    fn form(email: &str) -> ApplicationForm {
        ApplicationForm {
            name: "Rock Co".to_owned(),
            email: email.to_owned(),
            website: "https://rock.example".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_filtered_lists_are_subsets() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let onboarding = OnboardingService::new(&store, &cache);
        onboarding.submit_application(&form("a@b.com")).await.unwrap();
        onboarding.submit_application(&form("c@d.com")).await.unwrap();

        let catalog = CatalogService::new(&store, &cache);
        let all = catalog.rocks(false).await.unwrap();
        let visible = catalog.rocks(true).await.unwrap();

        assert_eq!(all.len(), 2);
        assert!(visible.is_empty());
        assert!(visible.iter().all(|r| all.contains(r)));
        assert!(catalog.merchants(true).await.unwrap().is_empty());
        assert_eq!(catalog.merchants(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reviews_newest_first() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let onboarding = OnboardingService::new(&store, &cache);
        let first = onboarding.submit_application(&form("a@b.com")).await.unwrap();
        let second = onboarding.submit_application(&form("c@d.com")).await.unwrap();

        let reviews = CatalogService::new(&store, &cache).reviews().await.unwrap();
        let ids: Vec<_> = reviews.iter().map(|r| r.review.id).collect();
        assert_eq!(ids, vec![second.review.id, first.review.id]);
        assert_eq!(reviews[0].merchant.email.as_str(), "c@d.com");
    }

    #[tokio::test]
    async fn test_add_rock_mirrors_approval() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let submitted = OnboardingService::new(&store, &cache)
            .submit_application(&form("a@b.com"))
            .await
            .unwrap();

        let catalog = CatalogService::new(&store, &cache);
        let rock = catalog
            .add_rock(
                submitted.merchant.id,
                &RockForm {
                    name: "  Flat Skipper ".to_owned(),
                    ..RockForm::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(rock.name, "Flat Skipper");
        assert!(!rock.is_greenlisted);
        assert_eq!(catalog.rocks(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rock_reads_merchant_under_lock() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let submitted = OnboardingService::new(&store, &cache)
            .submit_application(&form("a@b.com"))
            .await
            .unwrap();
        store.fail_on(FailurePoint::LockMerchant);

        let catalog = CatalogService::new(&store, &cache);
        let err = catalog
            .add_rock(
                submitted.merchant.id,
                &RockForm {
                    name: "Pebble".to_owned(),
                    ..RockForm::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(catalog.rocks(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rock_rejects_bad_input() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let catalog = CatalogService::new(&store, &cache);

        let err = catalog
            .add_rock(MerchantId::new(1), &RockForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = catalog
            .add_rock(
                MerchantId::new(1),
                &RockForm {
                    name: "Pebble".to_owned(),
                    ..RockForm::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_review_detail_not_found() {
        let store = MemoryStore::new();
        let cache = ReadCache::new(Duration::from_secs(60));
        let err = CatalogService::new(&store, &cache)
            .review_detail(ReviewId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
