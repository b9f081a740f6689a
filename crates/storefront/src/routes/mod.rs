//! Route handlers for the storefront API.

pub mod assistant;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Build the storefront router.
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::show))
        .route(
            "/products/{id}/reviews",
            get(products::list_reviews).post(products::add_review),
        )
        // Cart
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        // Checkout
        .route("/checkout/message", post(checkout::message_handoff))
        .route("/checkout/session", post(checkout::payment_session))
        // Order history
        .route("/orders", get(orders::list_mine))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/cancel", post(orders::cancel))
        // Assistant
        .route("/assistant", post(assistant::ask))
        // Auth
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
}
