//! Core types for Rock Skimmer.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod status;
pub mod website;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
pub use website::{Website, WebsiteError};
