//! Password registration, login, and logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use super::extract::ApiJson;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{clear_session, set_current_user};
use crate::models::{CurrentUser, User};
use crate::state::AppState;

/// Credentials body for register and login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.auth().register(&body.email, &body.password).await?;
    start_session(&session, &user).await?;
    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<Json<User>, AppError> {
    let user = state.auth().login(&body.email, &body.password).await?;
    start_session(&session, &user).await?;
    info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

/// Sign out and drop the session (including any dev override).
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_session(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
