//! Rock Skimmer Core - Shared types library.
//!
//! This crate provides common types used across all Rock Skimmer components:
//! - `server` - Catalog, merchant onboarding, and moderation web server
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, validated email and website values, and the
//!   review status / role / cascade mode enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
