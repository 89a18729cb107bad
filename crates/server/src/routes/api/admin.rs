//! Moderation endpoints. Every handler requires an admin.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use rock_skimmer_core::{MerchantId, ReviewId};

use super::extract::{ApiJson, ApiPath};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{ReviewDetail, ReviewWithMerchant, Rock};
use crate::services::catalog::RockForm;
use crate::services::moderation::{CascadeOutcome, StatusChange};
use crate::state::AppState;

/// All applications with their review status, newest first.
pub async fn list_applications(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewWithMerchant>>, AppError> {
    let reviews = state.catalog().reviews().await?;
    Ok(Json(reviews.to_vec()))
}

/// One application with its merchant and rocks.
pub async fn application_detail(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<Json<ReviewDetail>, AppError> {
    Ok(Json(state.catalog().review_detail(id).await?))
}

/// Change an application's status and run the approval cascade.
pub async fn set_status(
    RequireAdmin(viewer): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<CascadeOutcome>, AppError> {
    tracing::info!(
        review_id = %id,
        moderator = ?viewer.email(),
        status = %change.status,
        "Status change requested"
    );
    let outcome = state.moderation().set_review_status(id, &change).await?;
    Ok(Json(outcome))
}

/// Add a rock to a merchant.
pub async fn add_rock(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MerchantId>,
    ApiJson(form): ApiJson<RockForm>,
) -> Result<(StatusCode, Json<Rock>), AppError> {
    let rock = state.catalog().add_rock(id, &form).await?;
    Ok((StatusCode::CREATED, Json(rock)))
}
