//! Admin authentication.
//!
//! Admins sign in through the same identity provider as shoppers; what
//! gates this surface is the `isAdmin` flag on the user document, checked
//! at sign-in time and carried in the session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use truesoul_core::UserId;

/// Session key for the signed-in admin.
pub const ADMIN_USER_KEY: &str = "admin_user";

/// The signed-in admin, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Extractor that requires a signed-in admin.
pub struct RequireAdmin(pub AdminUser);

/// Error returned when admin authentication is required but absent.
pub struct AdminRejection;

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "Admin sign-in required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or(AdminRejection)?;

        let user: AdminUser = session
            .get(ADMIN_USER_KEY)
            .await
            .ok()
            .flatten()
            .ok_or(AdminRejection)?;

        Ok(Self(user))
    }
}

/// Helper to set the signed-in admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_admin_user(
    session: &Session,
    user: &AdminUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(ADMIN_USER_KEY, user).await
}

/// Helper to clear the signed-in admin from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_admin_user(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AdminUser>(ADMIN_USER_KEY).await?;
    Ok(())
}
