//! Grant or revoke the admin flag on a user profile.

use std::sync::Arc;

use tracing::info;

use truesoul_core::{Email, UserId};
use truesoul_services::clock::SystemClock;
use truesoul_services::users::UserStore;

use super::backend_from_env;

/// Toggle the admin flag, addressing the user by uid or email.
///
/// # Errors
///
/// Returns an error if neither uid nor email is given, the user cannot be
/// found, or the write fails.
pub async fn set_admin(
    uid: Option<&str>,
    email: Option<&str>,
    is_admin: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = backend_from_env()?;
    let users = UserStore::new(Arc::new(backend), Arc::new(SystemClock));

    let uid = match (uid, email) {
        (Some(uid), _) => UserId::new(uid),
        (None, Some(email)) => {
            let email = Email::parse(email)?;
            users
                .find_by_email(&email)
                .await?
                .ok_or_else(|| format!("no user with email {email}"))?
                .uid
        }
        (None, None) => return Err("pass either --uid or --email".into()),
    };

    let profile = users.set_admin(&uid, is_admin).await?;
    info!(
        uid = %profile.uid,
        email = %profile.email,
        is_admin = profile.is_admin,
        "admin flag updated"
    );
    Ok(())
}
