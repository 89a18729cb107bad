//! Public catalog listings.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{MerchantApplication, Rock};
use crate::state::AppState;

/// Query parameters for `GET /api/rocks`.
#[derive(Debug, Default, Deserialize)]
pub struct RocksQuery {
    #[serde(default)]
    pub greenlisted_only: bool,
}

/// Query parameters for `GET /api/merchants`.
#[derive(Debug, Default, Deserialize)]
pub struct MerchantsQuery {
    #[serde(default)]
    pub approved_only: bool,
}

/// List rocks, oldest first.
pub async fn list_rocks(
    State(state): State<AppState>,
    Query(query): Query<RocksQuery>,
) -> Result<Json<Vec<Rock>>, AppError> {
    let rocks = state.catalog().rocks(query.greenlisted_only).await?;
    Ok(Json(rocks.to_vec()))
}

/// List merchant applications, oldest first.
pub async fn list_merchants(
    State(state): State<AppState>,
    Query(query): Query<MerchantsQuery>,
) -> Result<Json<Vec<MerchantApplication>>, AppError> {
    let merchants = state.catalog().merchants(query.approved_only).await?;
    Ok(Json(merchants.to_vec()))
}
