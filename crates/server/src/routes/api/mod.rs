//! JSON API handlers, mounted under `/api`.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod catalog;
mod extract;
pub mod session;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the API router (paths relative to `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rocks", get(catalog::list_rocks))
        .route("/merchants", get(catalog::list_merchants))
        .route("/applications", post(applications::submit))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/session", get(session::show))
        .route("/session/admin-override", post(session::admin_override))
        .route("/admin/applications", get(admin::list_applications))
        .route("/admin/applications/{id}", get(admin::application_detail))
        .route("/admin/applications/{id}/status", post(admin::set_status))
        .route("/admin/merchants/{id}/rocks", post(admin::add_rock))
}
