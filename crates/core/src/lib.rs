//! TrueSoul Core - Shared types library.
//!
//! This crate provides common types used across all TrueSoul components:
//! - `storefront` - Public-facing shop API
//! - `admin` - Internal administration API
//! - `cli` - Command-line tools for seeding and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no remote
//! store access, no HTTP clients. This keeps it lightweight and allows it to
//! be used anywhere, including the client-local cart ledger.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`cart`] - The client-local cart ledger

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartLine, ProductSnapshot};
pub use types::*;
