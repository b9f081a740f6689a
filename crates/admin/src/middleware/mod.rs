//! Middleware and extractors for the admin API.

pub mod auth;

pub use auth::{AdminUser, RequireAdmin};

use tower_sessions::{MemoryStore, SessionManagerLayer};

/// Create the session layer for admin sessions.
#[must_use]
pub fn create_session_layer() -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default()).with_secure(false)
}
