//! Auth route handlers.
//!
//! Credentials go straight to the identity provider; this layer only
//! ensures a profile document exists (first sign-in creates one with
//! `isAdmin = false`) and keeps the signed-in user in the session.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use truesoul_core::Email;
use truesoul_services::identity::IdentityUser;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    CurrentUser, OptionalAuth, clear_current_user, set_current_user,
};
use crate::state::AppState;

/// Form data for registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Form data for sign-in.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

/// The signed-in user as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub uid: truesoul_core::UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Ensure the profile document and store the user in the session.
async fn establish_session(
    state: &AppState,
    session: &Session,
    identity: IdentityUser,
) -> Result<CurrentUser> {
    let email = Email::parse(&identity.email)
        .map_err(|e| AppError::Internal(format!("provider returned invalid email: {e}")))?;

    let profile = state
        .users()
        .ensure(&identity.uid, &email, identity.display_name.as_deref())
        .await?;

    let user = CurrentUser {
        uid: profile.uid,
        email: profile.email.into_inner(),
        display_name: profile.display_name,
        is_admin: profile.is_admin,
    };
    set_current_user(session, &user).await?;
    Ok(user)
}

/// Register a new account.
#[instrument(skip(state, session, form))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignUpForm>,
) -> Result<Json<UserView>> {
    Email::parse(&form.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let identity = state
        .identity()
        .sign_up(&form.email, &form.password, form.display_name.as_deref())
        .await?;
    let user = establish_session(&state, &session, identity).await?;
    Ok(Json(UserView::from(&user)))
}

/// Sign in with email and password.
#[instrument(skip(state, session, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignInForm>,
) -> Result<Json<UserView>> {
    let identity = state
        .identity()
        .sign_in(&form.email, &form.password)
        .await?;
    let user = establish_session(&state, &session, identity).await?;
    Ok(Json(UserView::from(&user)))
}

/// Sign out.
#[instrument(skip(session))]
pub async fn sign_out(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The current session's user, if any.
#[instrument(skip(user))]
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<Option<UserView>> {
    Json(user.as_ref().map(UserView::from))
}
