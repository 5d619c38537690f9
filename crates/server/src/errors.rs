//! # Server Errors
//!
//! `AppError` is the single error type returned by handlers. It renders as a
//! plain-text body with a status code derived from its variant. The `ApiJson`
//! and `ApiQuery` extractors funnel axum's own rejections into it, so a
//! malformed body or query string answers 400 in the same format.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use drivespot::SpotError;
use serde::Serialize;
use tracing::{error, warn};

/// A custom error type for the server application.
#[derive(Debug)]
pub enum AppError {
    /// The request itself is invalid.
    BadRequest(String),
    /// The addressed resource does not exist.
    NotFound(String),
    /// Errors originating from the `drivespot` library.
    Spot(SpotError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<SpotError> for AppError {
    fn from(err: SpotError) -> Self {
        AppError::Spot(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Spot(err) => {
                let status = match &err {
                    SpotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    SpotError::NotFound(_) => StatusCode::NOT_FOUND,
                    SpotError::PoiSource(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!("SpotError: {:?}", err);
                } else {
                    warn!("SpotError: {}", err);
                }
                (status, err.to_string())
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status_code, message).into_response()
    }
}

/// `axum::Json` with rejections mapped into [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// `axum::extract::Query` with rejections mapped into [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
