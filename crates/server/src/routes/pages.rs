//! Public pages: landing, catalog, and the application form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use super::chrome::PageChrome;
use crate::error::AppError;
use crate::filters;
use crate::middleware::Viewer;
use crate::models::Rock;
use crate::services::onboarding::ApplicationForm;
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// `?all=true` shows every rock instead of only greenlisted ones.
#[derive(Debug, Default, Deserialize)]
pub struct RocksQuery {
    #[serde(default)]
    pub all: bool,
}

/// Query parameters for the apply page.
#[derive(Debug, Default, Deserialize)]
pub struct ApplyQuery {
    #[serde(default)]
    pub submitted: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub chrome: PageChrome,
    pub rocks: Vec<Rock>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "rocks.html")]
pub struct RocksTemplate {
    pub chrome: PageChrome,
    pub rocks: Vec<Rock>,
    pub show_all: bool,
}

/// Merchant application form template.
#[derive(Template, WebTemplate)]
#[template(path = "apply.html")]
pub struct ApplyTemplate {
    pub chrome: PageChrome,
    pub form: ApplicationForm,
    pub error: Option<String>,
    pub submitted: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Landing page with the greenlisted catalog.
#[instrument(skip(state, viewer))]
pub async fn index(State(state): State<AppState>, viewer: Viewer) -> Result<Response, AppError> {
    let rocks = state.catalog().rocks(true).await?;
    Ok(IndexTemplate {
        chrome: PageChrome::new(&state, &viewer),
        rocks: rocks.to_vec(),
    }
    .into_response())
}

/// Catalog page with a greenlisted/all toggle.
#[instrument(skip(state, viewer))]
pub async fn rocks(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<RocksQuery>,
) -> Result<Response, AppError> {
    let rocks = state.catalog().rocks(!query.all).await?;
    Ok(RocksTemplate {
        chrome: PageChrome::new(&state, &viewer),
        rocks: rocks.to_vec(),
        show_all: query.all,
    }
    .into_response())
}

/// Display the merchant application form.
pub async fn apply_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ApplyQuery>,
) -> impl IntoResponse {
    ApplyTemplate {
        chrome: PageChrome::new(&state, &viewer),
        form: ApplicationForm::default(),
        error: None,
        submitted: query.submitted,
    }
}

/// Handle application form submission.
///
/// Validation errors re-render the form with the entered values.
pub async fn apply(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(form): Form<ApplicationForm>,
) -> Response {
    match state.onboarding().submit_application(&form).await {
        Ok(_) => Redirect::to("/apply?submitted=true").into_response(),
        Err(AppError::Validation(message)) => ApplyTemplate {
            chrome: PageChrome::new(&state, &viewer),
            form,
            error: Some(message),
            submitted: false,
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}
