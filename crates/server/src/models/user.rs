//! Login account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rock_skimmer_core::{Email, UserId};

/// A login account.
///
/// The password hash is never part of this type; repositories hand it out
/// separately so it cannot leak through serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}
