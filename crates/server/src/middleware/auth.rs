//! Authentication extractors.
//!
//! The session only stores *who* the user is ([`CurrentUser`]). Whether they
//! may moderate is decided per request from the role table, so revoking a
//! role takes effect on the next request.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::warn;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Where the admin flag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSource {
    /// The user's role record.
    Role,
    /// The developer toggle (only with dev controls enabled).
    DevOverride,
    /// Not an admin.
    None,
}

/// The requesting identity and its resolved admin flag.
///
/// Never rejects; anonymous requests get `user: None`.
#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub user: Option<CurrentUser>,
    pub is_admin: bool,
    pub admin_source: AdminSource,
}

impl Viewer {
    /// Resolve the viewer for a session.
    pub async fn resolve(state: &AppState, session: Option<&Session>) -> Self {
        let Some(session) = session else {
            return Self::anonymous();
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read session user");
                None
            });

        if state.config().dev_controls
            && let Ok(Some(is_admin)) = session.get::<bool>(session_keys::ADMIN_OVERRIDE).await
        {
            return Self {
                user,
                is_admin,
                admin_source: AdminSource::DevOverride,
            };
        }

        let is_admin = match &user {
            Some(user) => state.auth().is_admin(user.id).await,
            None => false,
        };

        Self {
            user,
            is_admin,
            admin_source: if is_admin {
                AdminSource::Role
            } else {
                AdminSource::None
            },
        }
    }

    const fn anonymous() -> Self {
        Self {
            user: None,
            is_admin: false,
            admin_source: AdminSource::None,
        }
    }

    /// The signed-in user's email, for page headers.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.user.as_ref().map(|u| u.email.to_string())
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().cloned();
        Ok(Self::resolve(state, session.as_ref()).await)
    }
}

/// Extractor that requires moderation rights.
///
/// Anonymous requests get 401 on `/api/` paths and a redirect to the login
/// page otherwise. Signed-in users without rights get 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_only(RequireAdmin(viewer): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {:?}!", viewer.email())
/// }
/// ```
pub struct RequireAdmin(pub Viewer);

/// Error returned when an admin is required.
#[derive(Debug)]
pub enum AdminRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but not an admin.
    Forbidden,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => {
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            }
            Self::Forbidden => {
                AppError::Forbidden("Administrator access required".to_string()).into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(viewer) = Viewer::from_request_parts(parts, state).await;

        if viewer.is_admin {
            return Ok(Self(viewer));
        }
        if viewer.user.is_some() {
            return Err(AdminRejection::Forbidden);
        }
        if parts.uri.path().starts_with("/api/") {
            Err(AdminRejection::Unauthorized)
        } else {
            Err(AdminRejection::RedirectToLogin)
        }
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Set or clear the developer admin override.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_admin_override(
    session: &Session,
    value: Option<bool>,
) -> Result<(), tower_sessions::session::Error> {
    match value {
        Some(is_admin) => session.insert(session_keys::ADMIN_OVERRIDE, is_admin).await,
        None => {
            session.remove::<bool>(session_keys::ADMIN_OVERRIDE).await?;
            Ok(())
        }
    }
}
