//! Application error type.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::nextrip::NexTripError;

use super::dto::ErrorResponse;

/// Application error type.
///
/// Every variant renders as `{"error": message}` with a matching status.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::BadGateway { message }
            | AppError::Internal { message } => message,
        }
    }
}

impl From<NexTripError> for AppError {
    fn from(e: NexTripError) -> Self {
        let message = e.to_string();
        match e {
            NexTripError::NotFound(_) => AppError::NotFound { message },
            NexTripError::InvalidRequest(_) => AppError::BadRequest { message },
            NexTripError::Fixture(_) | NexTripError::Config(_) => AppError::Internal { message },
            NexTripError::Http(_)
            | NexTripError::Api { .. }
            | NexTripError::Json { .. }
            | NexTripError::InvalidTime(_) => AppError::BadGateway { message },
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, message = self.message(), "request failed");

        let body = Json(ErrorResponse {
            error: self.message().to_string(),
        });
        (status, body).into_response()
    }
}
