//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rock_skimmer_core::ReviewStatus;

use crate::models::rock::DEFAULT_ROCK_IMAGE_URL;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Human label for a review status. Unknown values pass through.
///
/// Usage in templates: `{{ item.review.status|status_label }}`
#[askama::filter_fn]
pub fn status_label(status: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = status.to_string();
    Ok(raw.parse::<ReviewStatus>().map_or(raw, |status| label(status).to_owned()))
}

const fn label(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Pending => "Awaiting review",
        ReviewStatus::Approved => "Approved",
        ReviewStatus::Rejected => "Rejected",
    }
}

/// Image source for a rock card; blank URLs fall back to the stock photo.
///
/// Usage in templates: `{{ rock.image_url|rock_image }}`
#[askama::filter_fn]
pub fn rock_image(url: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let url = url.to_string();
    if url.trim().is_empty() {
        Ok(DEFAULT_ROCK_IMAGE_URL.to_owned())
    } else {
        Ok(url)
    }
}
