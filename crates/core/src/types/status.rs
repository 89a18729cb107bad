//! Status enums for moderation and access control.

use serde::{Deserialize, Serialize};

/// Moderation status of a merchant application's review record.
///
/// Only [`ReviewStatus::Approved`] makes a merchant (and its catalog items)
/// visible. Any status may move to any other; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "review_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Whether this status grants approval (and catalog visibility).
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Lowercase wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid review status: {s}")),
        }
    }
}

/// Role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// May approve, reject, and unapprove applications.
    Admin,
    /// Has a role record but no moderation rights.
    Viewer,
}

impl AdminRole {
    /// Whether this role grants moderation rights.
    #[must_use]
    pub const fn can_moderate(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Failure policy for the approval cascade.
///
/// - `Strict`: every step runs in one transaction; any failure rolls back the
///   whole status change.
/// - `BestEffort`: each step commits on its own; a failed merchant or catalog
///   step is reported as a warning and the review status is still saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    #[default]
    Strict,
    BestEffort,
}

impl std::fmt::Display for CascadeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::BestEffort => write!(f, "best_effort"),
        }
    }
}

impl std::str::FromStr for CascadeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            other => Err(format!("invalid cascade mode: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_roundtrip_names() {
        for status in ReviewStatus::ALL {
            assert_eq!(status.as_str().parse::<ReviewStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
        assert!("Approved".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_only_approved_is_approved() {
        assert!(ReviewStatus::Approved.is_approved());
        assert!(!ReviewStatus::Pending.is_approved());
        assert!(!ReviewStatus::Rejected.is_approved());
        assert_eq!(ReviewStatus::default(), ReviewStatus::Pending);
    }

    #[test]
    fn test_admin_role() {
        assert!(AdminRole::Admin.can_moderate());
        assert!(!AdminRole::Viewer.can_moderate());
        assert_eq!("viewer".parse::<AdminRole>().unwrap(), AdminRole::Viewer);
        assert!("super_admin".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_cascade_mode_parse() {
        assert_eq!("strict".parse::<CascadeMode>().unwrap(), CascadeMode::Strict);
        assert_eq!(
            "Best-Effort".parse::<CascadeMode>().unwrap(),
            CascadeMode::BestEffort
        );
        assert_eq!(CascadeMode::BestEffort.to_string(), "best_effort");
        assert!("lenient".parse::<CascadeMode>().is_err());
    }
}
