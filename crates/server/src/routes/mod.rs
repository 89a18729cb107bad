//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Store readiness check
//!
//! # Pages
//! GET  /                       - Landing page (greenlisted rocks)
//! GET  /rocks                  - Catalog (`?all=true` shows every rock)
//! GET  /apply                  - Merchant application form
//! POST /apply                  - Submit application
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//!
//! # Moderation (admin only)
//! GET  /admin                  - Application table
//! POST /admin/applications/{id}/status - Change status, run cascade
//!
//! # Developer controls (404 unless enabled)
//! POST /dev/admin-toggle       - Force the admin flag on/off for this session
//!
//! # JSON API
//! /api/...                     - See [`api`]
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod chrome;
pub mod health;
pub mod pages;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth page routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the moderation page routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/applications/{id}/status", post(admin::set_status))
}

/// Create all routes for the server.
///
/// Session and tracing layers are applied by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Pages
        .route("/", get(pages::index))
        .route("/rocks", get(pages::rocks))
        .route("/apply", get(pages::apply_page).post(pages::apply))
        // Auth
        .nest("/auth", auth_routes())
        // Moderation
        .nest("/admin", admin_routes())
        .route("/dev/admin-toggle", post(admin::dev_toggle))
        // JSON API
        .nest("/api", api::router())
}
