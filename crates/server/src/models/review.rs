//! Review record (moderation) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rock_skimmer_core::{MerchantId, ReviewId, ReviewStatus, RockId};

use super::{MerchantApplication, Rock};

/// The moderation record for a merchant application.
///
/// Exactly one exists per merchant; it is created in the same transaction as
/// the merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub merchant_application_id: MerchantId,
    /// The rock created alongside the application, if it still exists.
    pub rock_id: Option<RockId>,
    pub status: ReviewStatus,
    /// Free-text moderator notes (tags stripped).
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review joined with its merchant, as listed in the admin table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewWithMerchant {
    #[serde(flatten)]
    pub review: Review,
    pub merchant: MerchantApplication,
}

/// Everything an administrator sees for a single application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewDetail {
    pub review: Review,
    pub merchant: MerchantApplication,
    pub rocks: Vec<Rock>,
}
