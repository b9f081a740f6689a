//! Order store.
//!
//! Orders live in the `orders` collection. The store itself only reads and
//! writes order documents; anything that moves stock - placement and
//! cancellation - goes through [`crate::reconcile::OrderWorkflow`], which
//! owns the cross-document sequencing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use truesoul_core::{OrderId, OrderStatus, Price, ProductId, ProductSnapshot, UserId};

use crate::backend::{Document, DocumentBackend, collections, decode, encode};
use crate::clock::Clock;
use crate::error::StoreError;

const MAX_CAS_ATTEMPTS: u32 = 5;

/// A line item on an order: product reference, snapshot, and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    /// The product as it looked when the order was placed.
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl OrderItem {
    /// The rupee total for this line at order-time prices.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// A shipping address, as captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// An order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub shipping_address: Option<ShippingAddress>,
}

impl Order {
    fn from_doc(doc: &Document) -> Result<Self, StoreError> {
        let body: OrderBody = decode(doc)?;
        Ok(Self {
            id: OrderId::new(doc.id.clone()),
            user_id: body.user_id,
            items: body.items,
            total_amount: body.total_amount,
            status: body.status,
            order_date: body.order_date,
            shipping_address: body.shipping_address,
        })
    }

    fn body(&self) -> OrderBody {
        OrderBody {
            user_id: self.user_id.clone(),
            items: self.items.clone(),
            total_amount: self.total_amount,
            status: self.status,
            order_date: self.order_date,
            shipping_address: self.shipping_address.clone(),
        }
    }
}

/// The document shape stored in the `orders` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderBody {
    user_id: UserId,
    items: Vec<OrderItem>,
    total_amount: Price,
    status: OrderStatus,
    order_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shipping_address: Option<ShippingAddress>,
}

/// Fields for writing a new order document.
///
/// Produced by the reconciliation workflow once every stock decrement has
/// committed; nothing else should construct one.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub shipping_address: Option<ShippingAddress>,
}

/// Store for order documents.
#[derive(Clone)]
pub struct OrderStore {
    inner: Arc<OrderStoreInner>,
}

struct OrderStoreInner {
    backend: Arc<dyn DocumentBackend>,
    clock: Arc<dyn Clock>,
}

impl OrderStore {
    /// Create an order store over a document backend.
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(OrderStoreInner { backend, clock }),
        }
    }

    /// List every order, newest first. Admin surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or a document is corrupt.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let docs = self.inner.backend.list(collections::ORDERS).await?;
        let mut orders = docs
            .iter()
            .map(Order::from_doc)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    /// List one user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or a document is corrupt.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders = self.list().await?;
        orders.retain(|order| &order.user_id == user_id);
        Ok(orders)
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Order, StoreError> {
        let doc = self
            .inner
            .backend
            .get(collections::ORDERS, id.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        Order::from_doc(&doc)
    }

    /// Write a new order document with status `pending`.
    ///
    /// The order date comes from the injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[instrument(skip(self, new), fields(user_id = %new.user_id, items = new.items.len()))]
    pub async fn insert(&self, new: NewOrder) -> Result<Order, StoreError> {
        let body = OrderBody {
            user_id: new.user_id,
            items: new.items,
            total_amount: new.total_amount,
            status: OrderStatus::Pending,
            order_date: self.inner.clock.now(),
            shipping_address: new.shipping_address,
        };

        let doc = self
            .inner
            .backend
            .insert(collections::ORDERS, encode(&body)?)
            .await?;
        Order::from_doc(&doc)
    }

    /// Move an order to a new status along the forward chain.
    ///
    /// Rejects backward movement, writes out of terminal states, and any
    /// attempt to enter `cancelled` here - cancellation restores stock and
    /// must go through the workflow.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] for an illegal change and
    /// [`StoreError::NotFound`] for a missing order.
    #[instrument(skip(self), fields(id = %id, status = %status))]
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let current = self.get(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        self.write_status(id, status).await
    }

    /// Unconditional status write, used by the cancel workflow after it has
    /// validated the transition and restored stock.
    pub(crate) async fn write_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let doc = self
                .inner
                .backend
                .get(collections::ORDERS, id.as_str())
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
            let mut order = Order::from_doc(&doc)?;
            order.status = status;

            match self
                .inner
                .backend
                .put(
                    collections::ORDERS,
                    id.as_str(),
                    encode(&order.body())?,
                    Some(&doc.rev),
                )
                .await
            {
                Ok(_) => return Ok(order),
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::Conflict(format!("order {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use truesoul_core::Category;

    fn store() -> (OrderStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid"),
        ));
        let backend = Arc::new(MemoryBackend::new());
        (OrderStore::new(backend, Arc::clone(&clock) as _), clock)
    }

    fn item(id: &str, price: u64, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(id),
            product: ProductSnapshot {
                id: ProductId::new(id),
                name: format!("product {id}"),
                price: Price::from_rupees(price),
                category: Category::Rice,
                unit: "kg".to_owned(),
                stock_quantity: 100,
                image_url: None,
            },
            quantity,
        }
    }

    fn new_order(user: &str, items: Vec<OrderItem>) -> NewOrder {
        let total_amount = items.iter().map(OrderItem::line_total).sum();
        NewOrder {
            user_id: UserId::new(user),
            items,
            total_amount,
            shipping_address: None,
        }
    }

    #[tokio::test]
    async fn test_insert_starts_pending_with_clock_date() {
        let (store, clock) = store();
        let order = store
            .insert(new_order("u1", vec![item("p1", 120, 2)]))
            .await
            .expect("insert");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_date, clock.now());
        assert_eq!(order.total_amount, Price::from_rupees(240));
    }

    #[tokio::test]
    async fn test_list_by_user_filters_and_sorts() {
        let (store, clock) = store();
        store
            .insert(new_order("u1", vec![item("p1", 120, 1)]))
            .await
            .expect("insert");
        clock.advance(chrono::Duration::minutes(5));
        let newer = store
            .insert(new_order("u1", vec![item("p2", 80, 1)]))
            .await
            .expect("insert");
        store
            .insert(new_order("u2", vec![item("p3", 90, 1)]))
            .await
            .expect("insert");

        let orders = store.list_by_user(&UserId::new("u1")).await.expect("list");
        assert_eq!(orders.len(), 2);
        assert_eq!(orders.first().map(|o| o.id.clone()), Some(newer.id));
    }

    #[tokio::test]
    async fn test_update_status_forward() {
        let (store, _) = store();
        let order = store
            .insert(new_order("u1", vec![item("p1", 120, 1)]))
            .await
            .expect("insert");

        let updated = store
            .update_status(&order.id, OrderStatus::Confirmed)
            .await
            .expect("confirm");
        assert_eq!(updated.status, OrderStatus::Confirmed);

        let updated = store
            .update_status(&order.id, OrderStatus::Shipped)
            .await
            .expect("ship");
        assert_eq!(updated.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_update_status_rejects_backward_and_cancel() {
        let (store, _) = store();
        let order = store
            .insert(new_order("u1", vec![item("p1", 120, 1)]))
            .await
            .expect("insert");
        store
            .update_status(&order.id, OrderStatus::Shipped)
            .await
            .expect("ship");

        let backward = store.update_status(&order.id, OrderStatus::Pending).await;
        assert!(matches!(
            backward,
            Err(StoreError::InvalidTransition { .. })
        ));

        let cancel = store.update_status(&order.id, OrderStatus::Cancelled).await;
        assert!(matches!(cancel, Err(StoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_update_status_frozen_after_delivery() {
        let (store, _) = store();
        let order = store
            .insert(new_order("u1", vec![item("p1", 120, 1)]))
            .await
            .expect("insert");
        store
            .update_status(&order.id, OrderStatus::Delivered)
            .await
            .expect("deliver");

        let result = store.update_status(&order.id, OrderStatus::Shipped).await;
        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
    }
}
