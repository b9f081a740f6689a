//! Order-history route handlers.
//!
//! Shoppers only ever see their own orders; somebody else's order id reads
//! as not-found rather than forbidden.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::{instrument, warn};

use truesoul_core::{OrderId, OrderStatus, Price};
use truesoul_services::StoreError;
use truesoul_services::orders::{Order, ShippingAddress};

use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, RequireAuth};
use crate::state::AppState;

/// Order line display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: truesoul_core::ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
}

/// Order display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub items: Vec<OrderItemView>,
    pub total_amount: Price,
    pub total_display: String,
    pub status: OrderStatus,
    pub order_date: chrono::DateTime<chrono::Utc>,
    pub shipping_address: Option<ShippingAddress>,
    /// Stock restorations that failed during cancellation, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl OrderView {
    fn new(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    product_id: item.product_id.clone(),
                    name: item.product.name.clone(),
                    unit_price: item.product.price,
                    quantity: item.quantity,
                    line_total: item.line_total(),
                })
                .collect(),
            total_amount: order.total_amount,
            total_display: order.total_amount.to_string(),
            status: order.status,
            order_date: order.order_date,
            shipping_address: order.shipping_address.clone(),
            warnings: Vec::new(),
        }
    }
}

/// Fetch an order and hide other shoppers' orders behind not-found.
async fn owned_order(state: &AppState, user: &CurrentUser, id: &OrderId) -> Result<Order> {
    let order = state.orders().get(id).await?;
    if order.user_id != user.uid {
        return Err(AppError::NotFound(format!("order {id}")));
    }
    Ok(order)
}

/// List the signed-in user's orders, newest first.
#[instrument(skip(state, user), fields(user = %user.uid))]
pub async fn list_mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state.orders().list_by_user(&user.uid).await?;
    Ok(Json(orders.iter().map(OrderView::new).collect()))
}

/// Fetch one of the signed-in user's orders.
#[instrument(skip(state, user), fields(user = %user.uid, order = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = owned_order(&state, &user, &id).await?;
    Ok(Json(OrderView::new(&order)))
}

/// Cancel one of the signed-in user's orders.
///
/// A partially-restored cancellation still succeeds from the shopper's side
/// (the order is cancelled); the restoration gaps come back as warnings.
#[instrument(skip(state, user), fields(user = %user.uid, order = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    owned_order(&state, &user, &id).await?;

    match state.workflow().cancel_order(&id).await {
        Ok(order) => Ok(Json(OrderView::new(&order))),
        Err(StoreError::RestockIncomplete { failures }) => {
            warn!(order = %id, ?failures, "cancellation left stock unrestored");
            let order = state.orders().get(&id).await?;
            let mut view = OrderView::new(&order);
            view.warnings = failures;
            Ok(Json(view))
        }
        Err(e) => Err(e.into()),
    }
}
