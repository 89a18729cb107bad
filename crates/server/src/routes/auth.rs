//! Login and logout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::chrome::PageChrome;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::Viewer;
use crate::middleware::auth::{clear_session, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthError;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub chrome: PageChrome,
    pub error: Option<String>,
}

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let error = query.error.map(|code| {
        match code.as_str() {
            "credentials" => "Invalid email or password",
            "session" => "Could not start a session, please try again",
            _ => "Login failed",
        }
        .to_string()
    });

    LoginTemplate {
        chrome: PageChrome::new(&state, &viewer),
        error,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth().login(&form.email, &form.password).await {
        Ok(user) => {
            if let Err(e) = set_current_user(&session, &CurrentUser::from(&user)).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/auth/login?error=session").into_response();
            }
            set_sentry_user(&user.id, Some(user.email.as_str()));
            Redirect::to("/admin").into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed: invalid credentials");
            Redirect::to("/auth/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            Redirect::to("/auth/login?error=failed").into_response()
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_session(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    Redirect::to("/")
}
