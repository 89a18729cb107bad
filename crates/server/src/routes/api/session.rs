//! Identity and admin-flag introspection.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use super::extract::ApiJson;
use crate::error::AppError;
use crate::middleware::Viewer;
use crate::middleware::auth::set_admin_override;
use crate::state::AppState;

/// Body for `POST /api/session/admin-override`. `null` clears the override.
#[derive(Debug, Deserialize)]
pub struct OverrideBody {
    pub is_admin: Option<bool>,
}

/// Report the current identity and whether it is an admin.
pub async fn show(viewer: Viewer) -> Json<Viewer> {
    Json(viewer)
}

/// Developer toggle for the admin flag. 404 unless dev controls are on.
pub async fn admin_override(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<OverrideBody>,
) -> Result<Json<Viewer>, AppError> {
    if !state.config().dev_controls {
        return Err(AppError::NotFound("admin override".to_string()));
    }

    set_admin_override(&session, body.is_admin)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    info!(is_admin = ?body.is_admin, "Developer admin override changed");

    Ok(Json(Viewer::resolve(&state, Some(&session)).await))
}
