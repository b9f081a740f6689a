//! Dashboard aggregates.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use truesoul_core::{OrderStatus, Price, ProductId};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Stock level below which a product counts as low-stock.
const LOW_STOCK_THRESHOLD: u32 = 10;

/// A low-stock catalog entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockView {
    pub id: ProductId,
    pub name: String,
    pub stock_quantity: u32,
    pub unit: String,
}

/// A recent order, condensed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrderView {
    pub id: truesoul_core::OrderId,
    pub user_id: truesoul_core::UserId,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub order_date: chrono::DateTime<chrono::Utc>,
}

/// Dashboard summary payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub product_count: usize,
    pub order_count: usize,
    pub pending_orders: usize,
    /// Revenue across all non-cancelled orders.
    pub revenue: Price,
    pub revenue_display: String,
    pub low_stock: Vec<LowStockView>,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Summarize the store for the dashboard.
#[instrument(skip(state, _admin))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardView>> {
    let products = state.products().list().await?;
    let orders = state.orders().list().await?;

    let revenue: Price = orders
        .iter()
        .filter(|order| order.status != OrderStatus::Cancelled)
        .map(|order| order.total_amount)
        .sum();

    let pending_orders = orders
        .iter()
        .filter(|order| order.status == OrderStatus::Pending)
        .count();

    let low_stock = products
        .iter()
        .filter(|product| product.stock_quantity < LOW_STOCK_THRESHOLD)
        .map(|product| LowStockView {
            id: product.id.clone(),
            name: product.name.clone(),
            stock_quantity: product.stock_quantity,
            unit: product.unit.clone(),
        })
        .collect();

    let recent_orders = orders
        .iter()
        .take(5)
        .map(|order| RecentOrderView {
            id: order.id.clone(),
            user_id: order.user_id.clone(),
            total_amount: order.total_amount,
            status: order.status,
            order_date: order.order_date,
        })
        .collect();

    Ok(Json(DashboardView {
        product_count: products.len(),
        order_count: orders.len(),
        pending_orders,
        revenue,
        revenue_display: revenue.to_string(),
        low_stock,
        recent_orders,
    }))
}
