//! TrueSoul Services - managed-service clients and domain stores.
//!
//! Everything stateful lives behind a managed remote service: documents in a
//! hosted JSON document database, identities in a hosted identity provider,
//! the assistant behind an external text-generation API, and payments behind
//! a hosted checkout-session provider. This crate holds the typed clients
//! for those services and the domain stores built on top of them.
//!
//! # Architecture
//!
//! - [`backend`] - the document database seam: a [`backend::DocumentBackend`]
//!   trait with an HTTP implementation for production and an in-memory
//!   implementation for development and tests. Per-document optimistic
//!   concurrency (revision tokens) is the only atomicity primitive.
//! - [`products`], [`orders`], [`reviews`], [`users`] - typed stores over
//!   the backend, one per collection.
//! - [`reconcile`] - the order/stock reconciliation workflow: order placement
//!   with compensating rollback, cancellation with best-effort restock.
//! - [`identity`] - identity-provider REST client.
//! - [`assistant`] - language-model gateway for the shopping assistant.
//! - [`payments`] - hosted payment-session client (optional checkout path).
//! - [`clock`] - injected time source so stores never read ambient time.
//!
//! No store reads the system clock or generates timestamps implicitly;
//! a [`clock::Clock`] is injected so tests run on deterministic time.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod assistant;
pub mod backend;
pub mod clock;
pub mod error;
pub mod identity;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reconcile;
pub mod reviews;
pub mod users;

pub use assistant::{AssistantClient, AssistantConfig, AssistantError};
pub use backend::{DocStoreConfig, Document, DocumentBackend, HttpBackend, MemoryBackend, Revision};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::StoreError;
pub use identity::{IdentityClient, IdentityConfig, IdentityError, IdentityUser};
pub use orders::{NewOrder, Order, OrderItem, OrderStore, ShippingAddress};
pub use payments::{PaymentClient, PaymentConfig, PaymentError};
pub use products::{NewProduct, Product, ProductPatch, ProductStore};
pub use reconcile::{OrderWorkflow, PlacedLine};
pub use reviews::{NewReview, Review, ReviewStore};
pub use users::{UserProfile, UserStore};
