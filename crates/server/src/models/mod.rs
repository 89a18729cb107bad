//! Domain models for the server.
//!
//! These are the validated shapes that flow between the store, the services,
//! and the HTTP layer. Database rows decode straight into them.

pub mod merchant;
pub mod review;
pub mod rock;
pub mod session;
pub mod user;

pub use merchant::{MerchantApplication, NewMerchantApplication};
pub use review::{Review, ReviewDetail, ReviewWithMerchant};
pub use rock::{NewRock, Rock};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
