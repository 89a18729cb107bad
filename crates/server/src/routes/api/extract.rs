//! JSON and path extractors whose rejections render as `{"error": ...}`.

use axum::extract::{FromRequest, FromRequestParts, Path};

use crate::error::AppError;

/// `Json<T>` with failures mapped to [`AppError`].
///
/// Bodies that parse but don't fit `T` (missing field, unknown status) are
/// validation failures; everything else is a bad request.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path<T>` with failures mapped to [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
