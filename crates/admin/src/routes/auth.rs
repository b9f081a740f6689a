//! Admin sign-in.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::auth::{AdminUser, clear_admin_user, set_admin_user};
use crate::state::AppState;

/// Form data for admin sign-in.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

/// The signed-in admin as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub uid: truesoul_core::UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Sign in as an admin.
///
/// Credentials go to the identity provider; access additionally requires
/// the `isAdmin` flag on the user document. Non-admin accounts are rejected
/// without a session.
#[instrument(skip(state, session, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignInForm>,
) -> Result<Json<AdminView>> {
    let identity = state
        .identity()
        .sign_in(&form.email, &form.password)
        .await?;

    let profile = state
        .users()
        .get(&identity.uid)
        .await?
        .ok_or_else(|| AppError::Forbidden("no profile for this account".to_owned()))?;
    if !profile.is_admin {
        return Err(AppError::Forbidden("this account is not an admin".to_owned()));
    }

    let user = AdminUser {
        uid: profile.uid,
        email: profile.email.into_inner(),
        display_name: profile.display_name,
    };
    set_admin_user(&session, &user).await?;

    Ok(Json(AdminView {
        uid: user.uid.clone(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
    }))
}

/// Sign out.
#[instrument(skip(session))]
pub async fn sign_out(session: Session) -> Result<StatusCode> {
    clear_admin_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
