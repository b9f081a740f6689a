//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; no remote-call failure propagates as an unhandled
//! fault.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use truesoul_services::StoreError;
use truesoul_services::identity::IdentityError;
use truesoul_services::payments::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store or domain store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Payment provider operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Session read/write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A required external credential is not configured.
    #[error("Not configured: {0}")]
    Configuration(String),

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
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The message sent to the client. Internal details stay server-side.
    fn client_message(&self) -> String {
        match self {
            Self::Store(err) => match err {
                StoreError::Corrupt { .. } | StoreError::Internal(_) => {
                    "Internal server error".to_string()
                }
                StoreError::RemoteUnavailable(_) => {
                    "The store is temporarily unavailable, please try again".to_string()
                }
                other => other.to_string(),
            },
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials
                | IdentityError::EmailExists
                | IdentityError::WeakPassword(_) => err.to_string(),
                _ => "Sign-in service is temporarily unavailable".to_string(),
            },
            Self::Payment(_) => "Payment service is temporarily unavailable".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server-side failures to Sentry
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

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_store_error_status_mapping() {
        assert_eq!(
            status_of(AppError::Store(StoreError::NotFound("p1".to_owned()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::InsufficientStock {
                product: "rice".to_owned(),
                requested: 2,
                available: 1,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::InvalidRating(9))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::RemoteUnavailable(
                "down".to_owned()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_auth_and_client_errors() {
        assert_eq!(
            status_of(AppError::Unauthorized("sign in first".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::BadRequest("bad quantity".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Configuration("payments".to_owned())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_details_hidden_from_clients() {
        let err = AppError::Store(StoreError::Corrupt {
            id: "p1".to_owned(),
            message: "missing field stockQuantity".to_owned(),
        });
        assert_eq!(err.client_message(), "Internal server error");
    }
}
