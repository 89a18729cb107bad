//! Moderation pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use rock_skimmer_core::{ReviewId, ReviewStatus};

use super::chrome::PageChrome;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::middleware::auth::set_admin_override;
use crate::models::ReviewWithMerchant;
use crate::services::moderation::StatusChange;
use crate::state::AppState;

/// Outcome of the last action, carried in the redirect query string.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub updated: Option<ReviewId>,
    #[serde(default)]
    pub warnings: usize,
    pub error: Option<String>,
}

/// Status form posted from the application table.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: ReviewStatus,
    #[serde(default)]
    pub notes: String,
}

/// Developer toggle form. `admin` is `on`, `off`, or `clear`.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub admin: String,
}

/// Application table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub chrome: PageChrome,
    pub reviews: Vec<ReviewWithMerchant>,
    pub updated: Option<ReviewId>,
    pub warnings: usize,
    pub error: Option<String>,
}

/// Application table with approve/reject/unapprove actions.
pub async fn index(
    RequireAdmin(viewer): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, AppError> {
    let reviews = state.catalog().reviews().await?;
    Ok(AdminTemplate {
        chrome: PageChrome::new(&state, &viewer),
        reviews: reviews.to_vec(),
        updated: query.updated,
        warnings: query.warnings,
        error: query.error,
    }
    .into_response())
}

/// Handle a status form post and redirect back to the table.
pub async fn set_status(
    RequireAdmin(viewer): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let change = StatusChange {
        status: form.status,
        notes: Some(form.notes),
        mode: None,
    };

    match state.moderation().set_review_status(id, &change).await {
        Ok(outcome) => {
            info!(
                review_id = %id,
                moderator = ?viewer.email(),
                warnings = outcome.warnings.len(),
                "Status changed from admin page"
            );
            Redirect::to(&format!(
                "/admin?updated={id}&warnings={}",
                outcome.warnings.len()
            ))
            .into_response()
        }
        Err(e) => {
            warn!(review_id = %id, error = %e, "Status change failed");
            let code = match e {
                AppError::NotFound(_) => "not_found",
                AppError::Validation(_) => "invalid",
                AppError::Cascade { .. } => "cascade",
                _ => "failed",
            };
            Redirect::to(&format!("/admin?error={code}")).into_response()
        }
    }
}

/// Developer admin toggle. 404 unless dev controls are on.
pub async fn dev_toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, AppError> {
    if !state.config().dev_controls {
        return Err(AppError::NotFound("dev controls".to_string()));
    }

    let value = match form.admin.as_str() {
        "on" => Some(true),
        "off" => Some(false),
        "clear" => None,
        other => return Err(AppError::BadRequest(format!("unknown toggle value: {other}"))),
    };

    set_admin_override(&session, value)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    info!(is_admin = ?value, "Developer admin override changed");

    Ok(Redirect::to(if value == Some(true) { "/admin" } else { "/" }))
}
