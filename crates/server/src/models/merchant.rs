//! Merchant application domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rock_skimmer_core::{Email, MerchantId, Website};

/// A prospective seller's onboarding record.
///
/// `is_approved` is only ever written by the approval cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantApplication {
    /// Unique merchant ID.
    pub id: MerchantId,
    /// Business display name.
    pub name: String,
    /// Contact email (unique across applications).
    pub email: Email,
    /// Storefront URL.
    pub website: Website,
    /// Whether the merchant is currently approved.
    pub is_approved: bool,
    /// When the application was submitted.
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a merchant application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMerchantApplication {
    pub name: String,
    pub email: Email,
    pub website: Website,
}
