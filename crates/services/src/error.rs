//! Store-level error taxonomy.
//!
//! One flat enum covers the document backend and every store built on it, so
//! call sites match on domain outcomes (`InsufficientStock`, `OrderRejected`)
//! without caring which layer produced them.

use thiserror::Error;

use truesoul_core::OrderStatus;

/// Errors surfaced by the document backend and the domain stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A product, order, or user document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stock decrement would drive the quantity negative.
    ///
    /// The failed decrement leaves stock unchanged.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name (falls back to the id when the name is unknown).
        product: String,
        requested: u32,
        available: u32,
    },

    /// An absolute stock write was asked to store an invalid quantity.
    #[error("invalid stock quantity: {0}")]
    InvalidStock(i64),

    /// An illegal order-status change.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Order creation was aborted; stock already decremented for earlier
    /// line items has been rolled back.
    ///
    /// Any compensating increments that themselves failed are listed in
    /// `rollback_failures` rather than silently dropped.
    #[error("order rejected: {reason}{}", format_failures(rollback_failures))]
    OrderRejected {
        reason: String,
        rollback_failures: Vec<String>,
    },

    /// An order was cancelled but one or more stock restorations failed.
    #[error("order cancelled, but stock restoration failed for: {}", failures.join("; "))]
    RestockIncomplete { failures: Vec<String> },

    /// A review rating outside the 1-5 contract.
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// A guarded write kept losing the revision race and gave up.
    #[error("write conflict on {0}: too many concurrent updates")]
    Conflict(String),

    /// The remote store could not be reached or refused the request.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// A stored document failed to decode into its domain shape.
    #[error("corrupt document {id}: {message}")]
    Corrupt { id: String, message: String },

    /// An internal invariant failed (e.g. a poisoned lock in the in-memory
    /// backend).
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether retrying the same call might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::RemoteUnavailable(_))
    }
}

fn format_failures(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" (rollback failures: {})", failures.join("; "))
    }
}
