//! Route handlers for the admin API.

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Build the admin router.
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        // Dashboard
        .route("/dashboard", get(dashboard::summary))
        // Catalog management
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            put(products::update).delete(products::remove),
        )
        .route("/products/{id}/stock", put(products::set_stock))
        // Order management
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/cancel", post(orders::cancel))
        // User management
        .route("/users", get(users::list))
        .route("/users/{uid}/admin", put(users::set_admin))
}
