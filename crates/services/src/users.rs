//! User profile documents.
//!
//! Authentication belongs to the identity provider; this store only keeps
//! the profile document created on first sign-in (keyed by the provider's
//! uid) and the `isAdmin` flag that gates the admin surface.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use truesoul_core::{Email, UserId};

use crate::backend::{Document, DocumentBackend, collections, decode, encode};
use crate::clock::Clock;
use crate::error::StoreError;

/// A user profile.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    fn from_doc(doc: &Document) -> Result<Self, StoreError> {
        let body: UserBody = decode(doc)?;
        Ok(Self {
            uid: UserId::new(doc.id.clone()),
            email: body.email,
            display_name: body.display_name,
            is_admin: body.is_admin,
            created_at: body.created_at,
        })
    }

    fn body(&self) -> UserBody {
        UserBody {
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

/// The document shape stored in the `users` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

/// Store for user profile documents.
#[derive(Clone)]
pub struct UserStore {
    inner: Arc<UserStoreInner>,
}

struct UserStoreInner {
    backend: Arc<dyn DocumentBackend>,
    clock: Arc<dyn Clock>,
}

impl UserStore {
    /// Create a user store over a document backend.
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(UserStoreInner { backend, clock }),
        }
    }

    /// Fetch a profile by uid, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the document is
    /// corrupt.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn get(&self, uid: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let doc = self
            .inner
            .backend
            .get(collections::USERS, uid.as_str())
            .await?;
        doc.as_ref().map(UserProfile::from_doc).transpose()
    }

    /// Fetch the existing profile or create one on first sign-in.
    ///
    /// New profiles always start with `is_admin = false`; the flag is only
    /// raised through [`Self::set_admin`].
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the initial write fails.
    #[instrument(skip(self, email, display_name), fields(uid = %uid))]
    pub async fn ensure(
        &self,
        uid: &UserId,
        email: &Email,
        display_name: Option<&str>,
    ) -> Result<UserProfile, StoreError> {
        if let Some(profile) = self.get(uid).await? {
            return Ok(profile);
        }

        let profile = UserProfile {
            uid: uid.clone(),
            email: email.clone(),
            display_name: display_name.map(ToOwned::to_owned),
            is_admin: false,
            created_at: self.inner.clock.now(),
        };
        self.inner
            .backend
            .put(
                collections::USERS,
                uid.as_str(),
                encode(&profile.body())?,
                None,
            )
            .await?;
        Ok(profile)
    }

    /// List every profile. Admin surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or a document is corrupt.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let docs = self.inner.backend.list(collections::USERS).await?;
        let mut profiles = docs
            .iter()
            .map(UserProfile::from_doc)
            .collect::<Result<Vec<_>, _>>()?;
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(profiles)
    }

    /// Find a profile by email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|profile| profile.email == *email))
    }

    /// Raise or clear the admin flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the profile does not exist.
    #[instrument(skip(self), fields(uid = %uid, is_admin))]
    pub async fn set_admin(&self, uid: &UserId, is_admin: bool) -> Result<UserProfile, StoreError> {
        let mut profile = self
            .get(uid)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {uid}")))?;
        profile.is_admin = is_admin;

        self.inner
            .backend
            .put(
                collections::USERS,
                uid.as_str(),
                encode(&profile.body())?,
                None,
            )
            .await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn store() -> UserStore {
        let clock: Arc<FixedClock> = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid"),
        ));
        UserStore::new(Arc::new(MemoryBackend::new()), clock)
    }

    fn email(s: &str) -> Email {
        Email::parse(s).expect("valid email")
    }

    #[tokio::test]
    async fn test_ensure_creates_non_admin_profile_once() {
        let store = store();
        let uid = UserId::new("uid-1");

        let created = store
            .ensure(&uid, &email("asha@example.com"), Some("Asha"))
            .await
            .expect("ensure");
        assert!(!created.is_admin);
        assert_eq!(created.display_name.as_deref(), Some("Asha"));

        // A second sign-in returns the stored profile untouched
        let again = store
            .ensure(&uid, &email("other@example.com"), None)
            .await
            .expect("ensure again");
        assert_eq!(again, created);
    }

    #[tokio::test]
    async fn test_set_admin_round_trip() {
        let store = store();
        let uid = UserId::new("uid-1");
        store
            .ensure(&uid, &email("asha@example.com"), None)
            .await
            .expect("ensure");

        let promoted = store.set_admin(&uid, true).await.expect("promote");
        assert!(promoted.is_admin);
        assert!(store.get(&uid).await.expect("get").expect("present").is_admin);

        let demoted = store.set_admin(&uid, false).await.expect("demote");
        assert!(!demoted.is_admin);
    }

    #[tokio::test]
    async fn test_set_admin_missing_user() {
        let store = store();
        let result = store.set_admin(&UserId::new("ghost"), true).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let store = store();
        store
            .ensure(&UserId::new("uid-1"), &email("asha@example.com"), None)
            .await
            .expect("ensure");

        let found = store
            .find_by_email(&email("asha@example.com"))
            .await
            .expect("find");
        assert_eq!(found.map(|p| p.uid), Some(UserId::new("uid-1")));

        let missing = store
            .find_by_email(&email("nobody@example.com"))
            .await
            .expect("find");
        assert!(missing.is_none());
    }
}
