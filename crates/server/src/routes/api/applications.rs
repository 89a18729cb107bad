//! Merchant application submission.

use axum::{Json, extract::State, http::StatusCode};

use super::extract::ApiJson;
use crate::error::AppError;
use crate::services::onboarding::{ApplicationForm, SubmittedApplication};
use crate::state::AppState;

/// Submit a merchant application.
///
/// Returns 201 with the created merchant, rock, and pending review.
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ApplicationForm>,
) -> Result<(StatusCode, Json<SubmittedApplication>), AppError> {
    let submitted = state.onboarding().submit_application(&form).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}
