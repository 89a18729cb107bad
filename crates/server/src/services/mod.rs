//! Business logic services.
//!
//! Handlers build a service from [`crate::state::AppState`] and call it; the
//! services own validation, transactions, and cache invalidation.

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod moderation;
pub mod onboarding;

pub use auth::{AuthError, AuthService};
pub use cache::ReadCache;
pub use catalog::CatalogService;
pub use moderation::ModerationService;
pub use onboarding::OnboardingService;
