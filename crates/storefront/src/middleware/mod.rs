//! Middleware and extractors for the storefront.

pub mod auth;

pub use auth::{CurrentUser, OptionalAuth, RequireAuth};

use tower_sessions::{MemoryStore, SessionManagerLayer};

/// Create the session layer.
///
/// Sessions back both the signed-in user and the cart ledger. The store is
/// in-memory: losing a session on restart costs a cart, never an order.
#[must_use]
pub fn create_session_layer() -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default()).with_secure(false)
}
