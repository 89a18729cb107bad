//! Persistence for the Rock Skimmer server.
//!
//! # Tables
//!
//! - `merchant_application` - Seller onboarding records (email unique)
//! - `rock` - Catalog items, optionally owned by a merchant
//! - `merchant_review` - One moderation record per merchant
//! - `app_user` - Login accounts
//! - `admin_role` - Role records consulted for admin access
//! - `session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p rock-skimmer-cli -- migrate
//! ```
//!
//! # Store abstraction
//!
//! Services talk to a [`Store`] trait object rather than a pool so the same
//! cascade logic runs against `PostgreSQL` ([`PgStore`]) in production and
//! against [`MemoryStore`] in tests. Multi-step writes go through a
//! [`StoreTx`]; nothing is visible to other readers until
//! [`StoreTx::commit`] succeeds, and dropping an uncommitted transaction
//! discards its writes.

pub mod memory;
pub mod merchants;
pub mod postgres;
pub mod reviews;
pub mod rocks;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use rock_skimmer_core::{AdminRole, Email, MerchantId, ReviewId, ReviewStatus, RockId, UserId};

use crate::models::{
    MerchantApplication, NewMerchantApplication, NewRock, Review, ReviewWithMerchant, Rock, User,
};

pub use memory::{FailurePoint, MemoryStore};
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Non-transactional reads plus account management.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction for a multi-step write.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Catalog items ordered by creation time (ties by id).
    async fn list_rocks(&self, greenlisted_only: bool) -> Result<Vec<Rock>, RepositoryError>;

    /// Merchant applications ordered by creation time (ties by id).
    async fn list_merchants(
        &self,
        approved_only: bool,
    ) -> Result<Vec<MerchantApplication>, RepositoryError>;

    /// All review records joined with their merchant, newest first.
    async fn list_reviews(&self) -> Result<Vec<ReviewWithMerchant>, RepositoryError>;

    async fn find_merchant_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<MerchantApplication>, RepositoryError>;

    /// Returns [`RepositoryError::Conflict`] when the email is taken.
    async fn create_user(&self, email: &Email, password_hash: &str)
    -> Result<User, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// The user together with their stored password hash.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// The role record for a user, if one exists.
    async fn role_for_user(&self, user_id: UserId) -> Result<Option<AdminRole>, RepositoryError>;

    /// Insert or replace a user's role.
    async fn grant_role(&self, user_id: UserId, role: AdminRole) -> Result<(), RepositoryError>;

    /// Remove a user's role record. Returns whether one existed.
    async fn revoke_role(&self, user_id: UserId) -> Result<bool, RepositoryError>;
}

/// A unit of work. Writes become visible only on [`StoreTx::commit`].
#[async_trait]
pub trait StoreTx: Send {
    /// Returns [`RepositoryError::Conflict`] when the email is taken.
    async fn insert_merchant(
        &mut self,
        new: &NewMerchantApplication,
    ) -> Result<MerchantApplication, RepositoryError>;

    async fn get_merchant(
        &mut self,
        id: MerchantId,
    ) -> Result<Option<MerchantApplication>, RepositoryError>;

    /// Read a merchant and lock it against approval changes until the
    /// transaction ends. Use before copying `is_approved` onto new rows.
    async fn lock_merchant(
        &mut self,
        id: MerchantId,
    ) -> Result<Option<MerchantApplication>, RepositoryError>;

    /// Set the approval flag. Takes the merchant row lock for the rest of the
    /// transaction. Returns [`RepositoryError::NotFound`] for an unknown id.
    async fn set_merchant_approved(
        &mut self,
        id: MerchantId,
        approved: bool,
    ) -> Result<MerchantApplication, RepositoryError>;

    async fn insert_rock(&mut self, new: &NewRock) -> Result<Rock, RepositoryError>;

    /// Rocks owned by a merchant, ordered by creation time.
    async fn rocks_for_merchant(&mut self, id: MerchantId) -> Result<Vec<Rock>, RepositoryError>;

    /// Set visibility on every rock the merchant owns and return them.
    async fn set_rocks_greenlisted(
        &mut self,
        id: MerchantId,
        greenlisted: bool,
    ) -> Result<Vec<Rock>, RepositoryError>;

    async fn insert_review(
        &mut self,
        merchant: MerchantId,
        rock: Option<RockId>,
    ) -> Result<Review, RepositoryError>;

    async fn get_review(&mut self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// Overwrite status and notes and bump `updated_at`.
    /// Returns [`RepositoryError::NotFound`] for an unknown id.
    async fn update_review(
        &mut self,
        id: ReviewId,
        status: ReviewStatus,
        notes: &str,
    ) -> Result<Review, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
