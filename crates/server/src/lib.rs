//! Rock Skimmer server library.
//!
//! Merchant onboarding and catalog moderation. Merchants apply, an admin
//! approves or rejects, and approval cascades to the visibility of the
//! merchant's rocks in the public catalog.
//!
//! The binary in `main.rs` wires this library to `PostgreSQL`; the
//! integration tests drive the same router over [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
