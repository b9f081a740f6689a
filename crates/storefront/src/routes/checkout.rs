//! Checkout route handlers.
//!
//! Two exits from the cart:
//! - the messaging handoff, which records the order through the
//!   reconciliation workflow and returns a pre-filled deep link;
//! - the optional hosted payment session, which returns a redirect URL and
//!   does no order bookkeeping at all.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use truesoul_core::Cart;
use truesoul_services::orders::ShippingAddress;
use truesoul_services::reconcile::PlacedLine;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::cart::{load_cart, save_cart};
use crate::services::messaging;
use crate::state::AppState;

/// Form data for the messaging checkout.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCheckoutForm {
    pub shipping_address: Option<ShippingAddress>,
}

/// Response for the messaging checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCheckoutResponse {
    pub order_id: truesoul_core::OrderId,
    pub whatsapp_url: String,
}

/// Place the order and hand off to the messaging app.
///
/// The order is recorded first - stock decremented, order document written -
/// and only then is the deep link composed, so the link always references a
/// real order id. The cart is cleared on success.
#[instrument(skip(state, session, user, form), fields(user = %user.uid))]
pub async fn message_handoff(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    form: Option<Json<MessageCheckoutForm>>,
) -> Result<Json<MessageCheckoutResponse>> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let lines: Vec<PlacedLine> = cart
        .lines()
        .iter()
        .map(|line| PlacedLine {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        })
        .collect();

    let shipping_address = form.and_then(|Json(form)| form.shipping_address);
    let order = state
        .workflow()
        .place_order(&user.uid, &lines, cart.total_amount(), shipping_address)
        .await?;

    let message =
        messaging::compose_order_message(&order, user.display_name.as_deref(), &user.email);
    let whatsapp_url = messaging::whatsapp_link(&state.config().whatsapp_phone, &message);

    save_cart(&session, &Cart::new()).await?;

    Ok(Json(MessageCheckoutResponse {
        order_id: order.id,
        whatsapp_url,
    }))
}

/// Response for the payment-session checkout.
#[derive(Debug, Serialize)]
pub struct PaymentSessionResponse {
    pub url: String,
}

/// Create a hosted payment session for the cart.
///
/// Pure payment plumbing: no stock movement, no order document. Returns the
/// provider's redirect URL.
#[instrument(skip(state, session, user), fields(user = %user.uid))]
pub async fn payment_session(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<PaymentSessionResponse>> {
    let Some(payments) = state.payments() else {
        return Err(AppError::Configuration(
            "payments are not configured on this store".to_owned(),
        ));
    };

    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let url = payments
        .create_checkout_session(cart.lines(), &user.email)
        .await?;
    Ok(Json(PaymentSessionResponse { url }))
}
