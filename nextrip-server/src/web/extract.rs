//! Extractors that reject with a JSON [`AppError`] instead of plain text.

use axum::extract::FromRequestParts;

use super::error::AppError;

/// `Path` extractor; a segment that fails to parse is a 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor; malformed query strings are a 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
