//! Unified error handling for the admin API.
//!
//! Same contract as the storefront: handlers return `Result<T, AppError>`,
//! server-side failures are captured to Sentry, and clients see sanitized
//! messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use truesoul_services::StoreError;
use truesoul_services::identity::IdentityError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store or domain store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Session read/write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not signed in, or not an admin.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::InsufficientStock { .. }
                | StoreError::InvalidTransition { .. }
                | StoreError::OrderRejected { .. }
                | StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::InvalidStock(_) | StoreError::InvalidRating(_) => {
                    StatusCode::BAD_REQUEST
                }
                StoreError::RemoteUnavailable(_) | StoreError::RestockIncomplete { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                StoreError::Corrupt { .. } | StoreError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::EmailExists => StatusCode::CONFLICT,
                IdentityError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Store(err) => match err {
                StoreError::Corrupt { .. } | StoreError::Internal(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let forbidden = AppError::Forbidden("admins only".to_owned()).into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let transition = AppError::Store(StoreError::InvalidTransition {
            from: truesoul_core::OrderStatus::Delivered,
            to: truesoul_core::OrderStatus::Cancelled,
        })
        .into_response();
        assert_eq!(transition.status(), StatusCode::CONFLICT);
    }
}
