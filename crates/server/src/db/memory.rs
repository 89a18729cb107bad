//! In-process [`Store`] used by tests and local experiments.
//!
//! A transaction holds the table lock for its whole lifetime and works on a
//! private copy of the tables; commit swaps the copy in. Transactions are
//! therefore fully serialised, which is stronger than `PostgreSQL` gives us but
//! preserves the same all-or-nothing visibility.
//!
//! Individual operations can be made to fail with [`MemoryStore::fail_on`] so
//! cascade failure handling can be exercised without a database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use rock_skimmer_core::{AdminRole, Email, MerchantId, ReviewId, ReviewStatus, RockId, UserId};

use super::{RepositoryError, Store, StoreTx};
use crate::models::{
    MerchantApplication, NewMerchantApplication, NewRock, Review, ReviewWithMerchant, Rock, User,
};

/// An operation that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    InsertMerchant,
    InsertRock,
    InsertReview,
    LockMerchant,
    SetMerchantApproved,
    SetRocksGreenlisted,
    UpdateReview,
    RoleLookup,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Failures(Arc<RwLock<HashSet<FailurePoint>>>);

impl Failures {
    fn check(&self, point: FailurePoint) -> Result<(), RepositoryError> {
        let armed = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&point);
        if armed {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "injected failure at {point:?}"
            ))));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    merchants: BTreeMap<MerchantId, MerchantApplication>,
    rocks: BTreeMap<RockId, Rock>,
    reviews: BTreeMap<ReviewId, Review>,
    users: BTreeMap<UserId, (User, String)>,
    roles: HashMap<UserId, AdminRole>,
}

fn next_id<K: Copy + Into<i32>, V>(map: &BTreeMap<K, V>) -> i32 {
    map.keys().next_back().map_or(1, |k| (*k).into() + 1)
}

fn sorted_rocks<'a>(rocks: impl Iterator<Item = &'a Rock>) -> Vec<Rock> {
    let mut out: Vec<Rock> = rocks.cloned().collect();
    out.sort_by_key(|r| (r.created_at, r.id));
    out
}

/// Mutex-guarded tables shared by every clone of the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failures: Failures,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `point` fail until cleared.
    pub fn fail_on(&self, point: FailurePoint) {
        self.failures
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point);
    }

    /// Disarm all injected failures.
    pub fn clear_failures(&self) {
        self.failures
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            failures: self.failures.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_rocks(&self, greenlisted_only: bool) -> Result<Vec<Rock>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(sorted_rocks(
            tables
                .rocks
                .values()
                .filter(|r| !greenlisted_only || r.is_greenlisted),
        ))
    }

    async fn list_merchants(
        &self,
        approved_only: bool,
    ) -> Result<Vec<MerchantApplication>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut out: Vec<_> = tables
            .merchants
            .values()
            .filter(|m| !approved_only || m.is_approved)
            .cloned()
            .collect();
        out.sort_by_key(|m| (m.created_at, m.id));
        Ok(out)
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewWithMerchant>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut out = tables
            .reviews
            .values()
            .map(|review| {
                let merchant = tables
                    .merchants
                    .get(&review.merchant_application_id)
                    .cloned()
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!(
                            "review {} references missing merchant",
                            review.id
                        ))
                    })?;
                Ok(ReviewWithMerchant {
                    review: review.clone(),
                    merchant,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        out.sort_by(|a, b| {
            (b.review.created_at, b.review.id).cmp(&(a.review.created_at, a.review.id))
        });
        Ok(out)
    }

    async fn find_merchant_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<MerchantApplication>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .merchants
            .values()
            .find(|m| &m.email == email)
            .cloned())
    }

    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|(u, _)| &u.email == email) {
            return Err(RepositoryError::Conflict(
                "email already registered".to_owned(),
            ));
        }
        let user = User {
            id: UserId::new(next_id(&tables.users)),
            email: email.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.id, (user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_credentials(email).await?.map(|(user, _)| user))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn role_for_user(&self, user_id: UserId) -> Result<Option<AdminRole>, RepositoryError> {
        self.failures.check(FailurePoint::RoleLookup)?;
        let tables = self.tables.lock().await;
        Ok(tables.roles.get(&user_id).copied())
    }

    async fn grant_role(&self, user_id: UserId, role: AdminRole) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.roles.insert(user_id, role);
        Ok(())
    }

    async fn revoke_role(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.roles.remove(&user_id).is_some())
    }
}

/// Exclusive transaction over the in-memory tables.
struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    failures: Failures,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_merchant(
        &mut self,
        new: &NewMerchantApplication,
    ) -> Result<MerchantApplication, RepositoryError> {
        self.failures.check(FailurePoint::InsertMerchant)?;
        if self.working.merchants.values().any(|m| m.email == new.email) {
            return Err(RepositoryError::Conflict(
                "merchant email already exists".to_owned(),
            ));
        }
        let merchant = MerchantApplication {
            id: MerchantId::new(next_id(&self.working.merchants)),
            name: new.name.clone(),
            email: new.email.clone(),
            website: new.website.clone(),
            is_approved: false,
            created_at: Utc::now(),
        };
        self.working.merchants.insert(merchant.id, merchant.clone());
        Ok(merchant)
    }

    async fn get_merchant(
        &mut self,
        id: MerchantId,
    ) -> Result<Option<MerchantApplication>, RepositoryError> {
        Ok(self.working.merchants.get(&id).cloned())
    }

    async fn lock_merchant(
        &mut self,
        id: MerchantId,
    ) -> Result<Option<MerchantApplication>, RepositoryError> {
        self.failures.check(FailurePoint::LockMerchant)?;
        Ok(self.working.merchants.get(&id).cloned())
    }

    async fn set_merchant_approved(
        &mut self,
        id: MerchantId,
        approved: bool,
    ) -> Result<MerchantApplication, RepositoryError> {
        self.failures.check(FailurePoint::SetMerchantApproved)?;
        let merchant = self
            .working
            .merchants
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        merchant.is_approved = approved;
        Ok(merchant.clone())
    }

    async fn insert_rock(&mut self, new: &NewRock) -> Result<Rock, RepositoryError> {
        self.failures.check(FailurePoint::InsertRock)?;
        let rock = Rock {
            id: RockId::new(next_id(&self.working.rocks)),
            name: new.name.clone(),
            description: new.description.clone(),
            image_url: new.image_url.clone(),
            is_greenlisted: new.is_greenlisted,
            created_at: Utc::now(),
            merchant_application_id: new.merchant_application_id,
        };
        self.working.rocks.insert(rock.id, rock.clone());
        Ok(rock)
    }

    async fn rocks_for_merchant(&mut self, id: MerchantId) -> Result<Vec<Rock>, RepositoryError> {
        Ok(sorted_rocks(
            self.working
                .rocks
                .values()
                .filter(|r| r.merchant_application_id == Some(id)),
        ))
    }

    async fn set_rocks_greenlisted(
        &mut self,
        id: MerchantId,
        greenlisted: bool,
    ) -> Result<Vec<Rock>, RepositoryError> {
        self.failures.check(FailurePoint::SetRocksGreenlisted)?;
        for rock in self.working.rocks.values_mut() {
            if rock.merchant_application_id == Some(id) {
                rock.is_greenlisted = greenlisted;
            }
        }
        self.rocks_for_merchant(id).await
    }

    async fn insert_review(
        &mut self,
        merchant: MerchantId,
        rock: Option<RockId>,
    ) -> Result<Review, RepositoryError> {
        self.failures.check(FailurePoint::InsertReview)?;
        if !self.working.merchants.contains_key(&merchant) {
            return Err(RepositoryError::NotFound);
        }
        if self
            .working
            .reviews
            .values()
            .any(|r| r.merchant_application_id == merchant)
        {
            return Err(RepositoryError::Conflict(
                "merchant already has a review".to_owned(),
            ));
        }
        let now = Utc::now();
        let review = Review {
            id: ReviewId::new(next_id(&self.working.reviews)),
            merchant_application_id: merchant,
            rock_id: rock,
            status: ReviewStatus::Pending,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.working.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_review(&mut self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.working.reviews.get(&id).cloned())
    }

    async fn update_review(
        &mut self,
        id: ReviewId,
        status: ReviewStatus,
        notes: &str,
    ) -> Result<Review, RepositoryError> {
        self.failures.check(FailurePoint::UpdateReview)?;
        let review = self
            .working
            .reviews
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        review.status = status;
        notes.clone_into(&mut review.notes);
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.failures.check(FailurePoint::Commit)?;
        let Self {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rock_skimmer_core::Website;

    fn new_merchant(email: &str) -> NewMerchantApplication {
        NewMerchantApplication {
            name: "Rock Co".to_owned(),
            email: Email::parse(email).unwrap(),
            website: Website::parse("https://rock.example").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_merchant(&new_merchant("a@b.com")).await.unwrap();
        drop(tx);

        assert!(store.list_merchants(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let merchant = tx.insert_merchant(&new_merchant("a@b.com")).await.unwrap();
        tx.commit().await.unwrap();

        let found = store
            .find_merchant_by_email(&merchant.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, merchant.id);
        assert!(!found.is_approved);
    }

    #[tokio::test]
    async fn test_duplicate_merchant_email_conflicts() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_merchant(&new_merchant("a@b.com")).await.unwrap();
        let err = tx
            .insert_merchant(&new_merchant("A@B.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_injected_failure_and_clear() {
        let store = MemoryStore::new();
        store.fail_on(FailurePoint::InsertMerchant);

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert_merchant(&new_merchant("a@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Database(_)));
        drop(tx);

        store.clear_failures();
        let mut tx = store.begin().await.unwrap();
        assert!(tx.insert_merchant(&new_merchant("a@b.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_greenlist_touches_only_owned_rocks() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let merchant = tx.insert_merchant(&new_merchant("a@b.com")).await.unwrap();
        tx.insert_rock(&NewRock::default_for(&merchant, false))
            .await
            .unwrap();
        tx.insert_rock(&NewRock {
            name: "Loose".to_owned(),
            description: String::new(),
            image_url: String::new(),
            is_greenlisted: false,
            merchant_application_id: None,
        })
        .await
        .unwrap();

        let updated = tx.set_rocks_greenlisted(merchant.id, true).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(updated.len(), 1);
        let visible = store.list_rocks(true).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].merchant_application_id, Some(merchant.id));
        assert_eq!(store.list_rocks(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_role_grant_requires_user() {
        let store = MemoryStore::new();
        let err = store
            .grant_role(UserId::new(99), AdminRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        let user = store
            .create_user(&Email::parse("admin@b.com").unwrap(), "hash")
            .await
            .unwrap();
        store.grant_role(user.id, AdminRole::Admin).await.unwrap();
        assert_eq!(
            store.role_for_user(user.id).await.unwrap(),
            Some(AdminRole::Admin)
        );
        assert!(store.revoke_role(user.id).await.unwrap());
        assert_eq!(store.role_for_user(user.id).await.unwrap(), None);
    }
}
