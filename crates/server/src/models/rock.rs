//! Catalog item domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rock_skimmer_core::{MerchantId, RockId};

use super::MerchantApplication;

/// Description given to the rock created for a merchant without one.
pub const DEFAULT_ROCK_DESCRIPTION: &str = "A premium skipping rock with perfect balance";

/// Image used for the rock created for a merchant without one.
pub const DEFAULT_ROCK_IMAGE_URL: &str = "https://example.com/default-rock.jpg";

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rock {
    pub id: RockId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    /// Catalog visibility. Mirrors the owning merchant's approval.
    pub is_greenlisted: bool,
    pub created_at: DateTime<Utc>,
    /// Owning merchant, if any.
    pub merchant_application_id: Option<MerchantId>,
}

/// Input for inserting a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRock {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub is_greenlisted: bool,
    pub merchant_application_id: Option<MerchantId>,
}

impl NewRock {
    /// The placeholder item every merchant starts with.
    #[must_use]
    pub fn default_for(merchant: &MerchantApplication, is_greenlisted: bool) -> Self {
        Self {
            name: format!("{}'s Default Rock", merchant.name),
            description: DEFAULT_ROCK_DESCRIPTION.to_owned(),
            image_url: DEFAULT_ROCK_IMAGE_URL.to_owned(),
            is_greenlisted,
            merchant_application_id: Some(merchant.id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rock_skimmer_core::{Email, Website};

    #[test]
    fn test_default_rock_content() {
        let merchant = MerchantApplication {
            id: MerchantId::new(4),
            name: "Rock Co".to_owned(),
            email: Email::parse("a@b.com").unwrap(),
            website: Website::parse("https://a.com").unwrap(),
            is_approved: false,
            created_at: Utc::now(),
        };

        let rock = NewRock::default_for(&merchant, true);
        assert_eq!(rock.name, "Rock Co's Default Rock");
        assert_eq!(rock.description, DEFAULT_ROCK_DESCRIPTION);
        assert_eq!(rock.image_url, DEFAULT_ROCK_IMAGE_URL);
        assert!(rock.is_greenlisted);
        assert_eq!(rock.merchant_application_id, Some(MerchantId::new(4)));
    }
}
