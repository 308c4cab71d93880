//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! envelope `{ "ok": false, "message": ... }`; validation errors add the
//! `missing` field list. Server errors are captured to Sentry before the
//! response is sent and never expose their details to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::models::CurrentUser;
use crate::services::AddressError;

/// Application-level error type for the address service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Address operation failed.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Required request fields are absent or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the named permission.
    #[error("Missing permission: {0}")]
    Forbidden(String),
}

/// Error envelope.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<&'a [String]>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Address(AddressError::NotFound) => StatusCode::NOT_FOUND,
            Self::Address(AddressError::Invalid(_)) | Self::MissingFields(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Address(AddressError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(self, Self::Address(AddressError::Repository(_)))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let missing = match &self {
            Self::MissingFields(fields) => Some(fields.as_slice()),
            _ => None,
        };

        let body = ErrorBody {
            ok: false,
            message,
            missing,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
///
/// Associates captured errors with the caller and tags their domain.
pub fn set_sentry_user(user: &CurrentUser) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            ..Default::default()
        }));
        scope.set_tag("domain", user.domain.as_str());
    });
}
