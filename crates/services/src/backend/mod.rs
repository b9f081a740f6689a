//! The document database seam.
//!
//! The managed store holds plain JSON documents in named collections. Every
//! document carries an opaque revision token that changes on each write;
//! a guarded [`DocumentBackend::put`] with an expected revision is the
//! single-document compare-and-swap primitive on which stock decrements are
//! built. There are no cross-document transactions - the reconciliation
//! workflow compensates instead.
//!
//! Two implementations:
//! - [`HttpBackend`] - the hosted document database, over its JSON REST API.
//! - [`MemoryBackend`] - an in-process map for development and tests, with
//!   the same revision semantics.

mod http;
mod memory;

pub use http::{DocStoreConfig, HttpBackend};
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Collection names used by the stores.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const USERS: &str = "users";
    pub const REVIEWS: &str = "reviews";

    /// All collections, for provisioning.
    pub const ALL: [&str; 4] = [PRODUCTS, ORDERS, USERS, REVIEWS];
}

/// An opaque per-document revision token.
///
/// Compares by exact value; the store guarantees the token changes on every
/// committed write to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as read from or written to the store.
#[derive(Debug, Clone)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: String,
    /// Revision of the committed write this document was read from.
    pub rev: Revision,
    /// The document body. Never contains store bookkeeping fields.
    pub body: Value,
}

/// Access to the remote document database.
///
/// All methods are single-document operations; `put` with an expected
/// revision is the only concurrency primitive.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Read a document. `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Read every document in a collection. Order is unspecified.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Create a document with a store-assigned identifier.
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError>;

    /// Write a document.
    ///
    /// With `expected = Some(rev)`, the write commits only if `rev` is still
    /// the document's current revision; otherwise it fails with
    /// [`StoreError::Conflict`]. With `expected = None`, the write is a
    /// plain overwrite (creating the document when absent).
    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected: Option<&Revision>,
    ) -> Result<Document, StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Decode a document body into a typed value.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] carrying the document id when the body
/// does not match the expected shape.
pub fn decode<T: serde::de::DeserializeOwned>(doc: &Document) -> Result<T, StoreError> {
    serde_json::from_value(doc.body.clone()).map_err(|e| StoreError::Corrupt {
        id: doc.id.clone(),
        message: e.to_string(),
    })
}

/// Encode a typed value into a document body.
///
/// # Errors
///
/// Returns [`StoreError::Internal`] if the value cannot be represented as
/// JSON (which would indicate a bug in the document types).
pub fn encode<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Internal(e.to_string()))
}
