//! Order management handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use truesoul_core::{OrderId, OrderStatus, Price, UserId};
use truesoul_services::StoreError;
use truesoul_services::orders::{Order, ShippingAddress};

use crate::error::Result;
use crate::middleware::RequireAdmin;
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

/// Order data as returned to the admin client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemView>,
    pub total_amount: Price,
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
            user_id: order.user_id.clone(),
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
            status: order.status,
            order_date: order.order_date,
            shipping_address: order.shipping_address.clone(),
            warnings: Vec::new(),
        }
    }
}

/// Form data for a status update.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    pub status: OrderStatus,
}

/// List every order, newest first.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state.orders().list().await?;
    Ok(Json(orders.iter().map(OrderView::new).collect()))
}

/// Fetch one order.
#[instrument(skip(state, _admin), fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = state.orders().get(&id).await?;
    Ok(Json(OrderView::new(&order)))
}

/// Move an order along the forward status chain.
///
/// Cancellation is not accepted here; it has stock side effects and goes
/// through the cancel endpoint.
#[instrument(skip(state, _admin, form), fields(id = %id, status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(form): Json<UpdateStatusForm>,
) -> Result<Json<OrderView>> {
    let order = state.orders().update_status(&id, form.status).await?;
    Ok(Json(OrderView::new(&order)))
}

/// Cancel an order, restoring stock for every line item.
#[instrument(skip(state, _admin), fields(id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
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
