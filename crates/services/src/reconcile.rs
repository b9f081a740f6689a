//! The order/stock reconciliation workflow.
//!
//! The document store commits one document at a time; there is no
//! transaction spanning N product decrements plus an order write. The
//! workflow compensates:
//!
//! 1. every per-product decrement runs first, each through the product
//!    store's own atomic primitive;
//! 2. the order-record write happens last, as the step least likely to fail;
//! 3. any mid-sequence failure triggers compensating increments for every
//!    product already decremented, in reverse order, before the failure is
//!    reported.
//!
//! Between steps 1 and 2 a concurrent reader can observe decremented stock
//! with no matching order. That window is accepted: the guarantee is that
//! stock is never oversold and that every failure path converges back to
//! consistent counts, not that the pair of writes is atomic.

use tracing::{instrument, warn};

use truesoul_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use crate::error::StoreError;
use crate::orders::{NewOrder, Order, OrderItem, OrderStore, ShippingAddress};
use crate::products::ProductStore;

/// One requested line of a new order: which product, how many.
#[derive(Debug, Clone)]
pub struct PlacedLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order placement and cancellation over the product and order stores.
#[derive(Clone)]
pub struct OrderWorkflow {
    products: ProductStore,
    orders: OrderStore,
}

impl OrderWorkflow {
    #[must_use]
    pub const fn new(products: ProductStore, orders: OrderStore) -> Self {
        Self { products, orders }
    }

    /// Place an order.
    ///
    /// Validates the request against current catalog state, decrements stock
    /// per line item, and only then writes the order document (status
    /// `pending`). `expected_total` is what the shopper saw at checkout; it
    /// must match the total recomputed from current prices, so a stale cart
    /// cannot silently buy at changed prices.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OrderRejected`] when validation fails, any
    /// decrement fails, or the order write fails. In the latter two cases
    /// every stock decrement already committed has been reversed; increments
    /// that themselves failed are aggregated on the error.
    #[instrument(skip(self, lines, shipping_address), fields(user_id = %user_id, lines = lines.len()))]
    pub async fn place_order(
        &self,
        user_id: &UserId,
        lines: &[PlacedLine],
        expected_total: Price,
        shipping_address: Option<ShippingAddress>,
    ) -> Result<Order, StoreError> {
        if lines.is_empty() {
            return Err(rejected("order has no items"));
        }
        if lines.iter().any(|line| line.quantity == 0) {
            return Err(rejected("line quantities must be at least 1"));
        }

        // Load every product up front: missing products and obviously short
        // stock reject the order before anything is written.
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = match self.products.get(&line.product_id).await {
                Ok(product) => product,
                Err(StoreError::NotFound(_)) => {
                    return Err(rejected(&format!(
                        "product {} no longer exists",
                        line.product_id
                    )));
                }
                Err(e) => return Err(e),
            };
            items.push(OrderItem {
                product_id: line.product_id.clone(),
                product: product.snapshot(),
                quantity: line.quantity,
            });
        }

        let total: Price = items.iter().map(OrderItem::line_total).sum();
        if total != expected_total {
            return Err(rejected(&format!(
                "total mismatch: cart shows {expected_total}, current prices give {total}"
            )));
        }

        // Decrement stock per line, remembering what has committed so a
        // failure can be compensated.
        let mut decremented: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
        for item in &items {
            match self
                .products
                .decrement_stock(&item.product_id, item.quantity)
                .await
            {
                Ok(()) => decremented.push((item.product_id.clone(), item.quantity)),
                Err(e) => {
                    let rollback_failures = self.rollback(&decremented).await;
                    return Err(StoreError::OrderRejected {
                        reason: e.to_string(),
                        rollback_failures,
                    });
                }
            }
        }

        // All stock is reserved; the order write is the last step.
        match self
            .orders
            .insert(NewOrder {
                user_id: user_id.clone(),
                items,
                total_amount: total,
                shipping_address,
            })
            .await
        {
            Ok(order) => Ok(order),
            Err(e) => {
                let rollback_failures = self.rollback(&decremented).await;
                Err(StoreError::OrderRejected {
                    reason: format!("order record could not be written: {e}"),
                    rollback_failures,
                })
            }
        }
    }

    /// Cancel an order, restoring stock for every line item.
    ///
    /// Restoration is best-effort per item: one failed restore does not stop
    /// the rest, and the order is still marked cancelled so it cannot be
    /// shipped. Item-level failures are surfaced via
    /// [`StoreError::RestockIncomplete`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] when the order is delivered
    /// or already cancelled, [`StoreError::RestockIncomplete`] when any
    /// restoration failed, or a store error if the status write fails.
    #[instrument(skip(self), fields(id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let order = self.orders.get(order_id).await?;
        if !order.status.can_cancel() {
            return Err(StoreError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let mut failures = Vec::new();
        for item in &order.items {
            if let Err(e) = self.restore(&item.product_id, item.quantity).await {
                warn!(product_id = %item.product_id, error = %e, "stock restore failed");
                failures.push(format!("{}: {e}", item.product_id));
            }
        }

        let cancelled = self
            .orders
            .write_status(order_id, OrderStatus::Cancelled)
            .await?;

        if failures.is_empty() {
            Ok(cancelled)
        } else {
            Err(StoreError::RestockIncomplete { failures })
        }
    }

    /// Add `quantity` back onto a product via an absolute stock write.
    async fn restore(&self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError> {
        let product = self.products.get(product_id).await?;
        let restored = i64::from(product.stock_quantity) + i64::from(quantity);
        self.products.set_stock(product_id, restored).await
    }

    /// Reverse committed decrements in reverse order. Returns descriptions
    /// of the increments that failed; these must be surfaced, not dropped.
    async fn rollback(&self, decremented: &[(ProductId, u32)]) -> Vec<String> {
        let mut failures = Vec::new();
        for (product_id, quantity) in decremented.iter().rev() {
            if let Err(e) = self.restore(product_id, *quantity).await {
                warn!(product_id = %product_id, error = %e, "compensating increment failed");
                failures.push(format!("{product_id}: {e}"));
            }
        }
        failures
    }
}

fn rejected(reason: &str) -> StoreError {
    StoreError::OrderRejected {
        reason: reason.to_owned(),
        rollback_failures: Vec::new(),
    }
}
