//! `PostgreSQL`-backed [`Store`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use rock_skimmer_core::{AdminRole, Email, MerchantId, ReviewId, ReviewStatus, RockId, UserId};

use super::{RepositoryError, Store, StoreTx, merchants, reviews, rocks, users};
use crate::models::{
    MerchantApplication, NewMerchantApplication, NewRock, Review, ReviewWithMerchant, Rock, User,
};

/// Store backed by a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (used by the session store).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_rocks(&self, greenlisted_only: bool) -> Result<Vec<Rock>, RepositoryError> {
        rocks::list(&self.pool, greenlisted_only).await
    }

    async fn list_merchants(
        &self,
        approved_only: bool,
    ) -> Result<Vec<MerchantApplication>, RepositoryError> {
        merchants::list(&self.pool, approved_only).await
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewWithMerchant>, RepositoryError> {
        reviews::list_with_merchant(&self.pool).await
    }

    async fn find_merchant_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<MerchantApplication>, RepositoryError> {
        merchants::find_by_email(&self.pool, email).await
    }

    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        users::create(&self.pool, email, password_hash).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        users::find_by_email(&self.pool, email).await
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        users::find_credentials(&self.pool, email).await
    }

    async fn role_for_user(&self, user_id: UserId) -> Result<Option<AdminRole>, RepositoryError> {
        users::role_for(&self.pool, user_id).await
    }

    async fn grant_role(&self, user_id: UserId, role: AdminRole) -> Result<(), RepositoryError> {
        users::grant_role(&self.pool, user_id, role).await
    }

    async fn revoke_role(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        users::revoke_role(&self.pool, user_id).await
    }
}

/// An open `PostgreSQL` transaction. Rolls back on drop.
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_merchant(
        &mut self,
        new: &NewMerchantApplication,
    ) -> Result<MerchantApplication, RepositoryError> {
        merchants::insert(&mut *self.tx, new).await
    }

    async fn get_merchant(
        &mut self,
        id: MerchantId,
    ) -> Result<Option<MerchantApplication>, RepositoryError> {
        merchants::get(&mut *self.tx, id).await
    }

    async fn lock_merchant(
        &mut self,
        id: MerchantId,
    ) -> Result<Option<MerchantApplication>, RepositoryError> {
        merchants::get_for_share(&mut *self.tx, id).await
    }

    async fn set_merchant_approved(
        &mut self,
        id: MerchantId,
        approved: bool,
    ) -> Result<MerchantApplication, RepositoryError> {
        merchants::set_approved(&mut *self.tx, id, approved).await
    }

    async fn insert_rock(&mut self, new: &NewRock) -> Result<Rock, RepositoryError> {
        rocks::insert(&mut *self.tx, new).await
    }

    async fn rocks_for_merchant(&mut self, id: MerchantId) -> Result<Vec<Rock>, RepositoryError> {
        rocks::for_merchant(&mut *self.tx, id).await
    }

    async fn set_rocks_greenlisted(
        &mut self,
        id: MerchantId,
        greenlisted: bool,
    ) -> Result<Vec<Rock>, RepositoryError> {
        rocks::set_greenlisted_for_merchant(&mut *self.tx, id, greenlisted).await
    }

    async fn insert_review(
        &mut self,
        merchant: MerchantId,
        rock: Option<RockId>,
    ) -> Result<Review, RepositoryError> {
        reviews::insert(&mut *self.tx, merchant, rock).await
    }

    async fn get_review(&mut self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        reviews::get(&mut *self.tx, id).await
    }

    async fn update_review(
        &mut self,
        id: ReviewId,
        status: ReviewStatus,
        notes: &str,
    ) -> Result<Review, RepositoryError> {
        reviews::update_status(&mut *self.tx, id, status, notes).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
