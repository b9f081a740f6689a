//! User management handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use truesoul_core::UserId;
use truesoul_services::users::UserProfile;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// User data as returned to the admin client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&UserProfile> for UserView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            email: profile.email.as_str().to_owned(),
            display_name: profile.display_name.clone(),
            is_admin: profile.is_admin,
            created_at: profile.created_at,
        }
    }
}

/// Form data for toggling the admin flag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminForm {
    pub is_admin: bool,
}

/// List every user profile.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<UserView>>> {
    let users = state.users().list().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

/// Raise or clear a user's admin flag.
///
/// An admin cannot demote their own account.
#[instrument(skip(state, admin, form), fields(uid = %uid))]
pub async fn set_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(uid): Path<UserId>,
    Json(form): Json<SetAdminForm>,
) -> Result<Json<UserView>> {
    if admin.uid == uid && !form.is_admin {
        return Err(AppError::BadRequest(
            "cannot remove your own admin access".to_owned(),
        ));
    }

    let profile = state.users().set_admin(&uid, form.is_admin).await?;
    Ok(Json(UserView::from(&profile)))
}
