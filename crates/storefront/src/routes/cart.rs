//! Cart route handlers.
//!
//! The cart ledger lives in the visitor's session, nowhere else. Loading is
//! best-effort: a session read failure or malformed payload starts an empty
//! cart instead of failing the request.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use truesoul_core::{Cart, Price, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Session key for the cart ledger.
pub const CART_KEY: &str = "cart";

/// Load the session cart; any failure reads as an empty cart.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(CART_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the session cart, best-effort durable across reloads.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(CART_KEY, cart).await?;
    Ok(())
}

/// Cart line display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub unit: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
    pub image_url: Option<String>,
}

/// Cart display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u32,
    pub total_amount: Price,
    pub total_display: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.clone(),
                    name: line.product.name.clone(),
                    unit: line.product.unit.clone(),
                    unit_price: line.product.price,
                    quantity: line.quantity,
                    line_total: line.line_total(),
                    image_url: line.product.image_url.clone(),
                })
                .collect(),
            total_items: cart.total_items(),
            total_amount: cart.total_amount(),
            total_display: cart.total_amount().to_string(),
        }
    }
}

/// Show the current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = load_cart(&session).await;
    Json(CartView::from(&cart))
}

/// Form data for adding to the cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Add a product to the cart.
///
/// The product is re-read from the catalog so the stock check and the
/// carried snapshot reflect current state, not whatever the client sent.
#[instrument(skip(state, session, form))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddItemForm>,
) -> Result<Json<CartView>> {
    let product = state.products().get(&form.product_id).await?;

    let mut cart = load_cart(&session).await;
    cart.add(product.snapshot(), form.quantity.unwrap_or(1))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Form data for overwriting a line quantity.
#[derive(Debug, Deserialize)]
pub struct SetQuantityForm {
    pub quantity: u32,
}

/// Overwrite a line's quantity; zero removes the line.
#[instrument(skip(session, form))]
pub async fn set_quantity(
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(form): Json<SetQuantityForm>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    cart.set_quantity(&product_id, form.quantity);
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove_item(
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    cart.remove(&product_id);
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let cart = Cart::new();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
