//! The client-local cart ledger.
//!
//! The cart is a quantity ledger keyed by product identifier. It lives
//! entirely in the shopper's session: the remote stores never see it until
//! checkout turns its lines into an order. Each line carries a denormalized
//! snapshot of the product as it looked when it was added, so the cart can
//! be rendered and totalled without further catalog reads.
//!
//! Persistence is best-effort. [`Cart::from_stored`] never fails: a
//! malformed payload yields an empty cart.

use serde::{Deserialize, Serialize};

use crate::types::{Category, Price, ProductId};

/// Errors surfaced by cart mutations.
///
/// These are local validation failures; they never touch the remote store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CartError {
    /// Requested quantity exceeds the product's last-known stock.
    #[error("not enough stock available: requested {requested}, only {available} left")]
    InsufficientStock {
        /// Quantity the shopper asked for (including what is already carted).
        requested: u32,
        /// Last-known stock for the product.
        available: u32,
    },
    /// A line quantity must be at least 1.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// Denormalized product data carried on cart and order lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Category,
    /// Unit label, e.g. "kg" or "liter".
    pub unit: String,
    /// Stock at the time the snapshot was taken.
    pub stock_quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A single cart line: one product and its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl CartLine {
    /// The rupee total for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// The cart ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Restore a cart from a stored payload.
    ///
    /// A read failure upstream should be treated the same way: start empty.
    /// Malformed payloads are discarded rather than surfaced, so a corrupt
    /// stored cart can never wedge a shopping session.
    #[must_use]
    pub fn from_stored(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or_default()
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// Rejects without mutating when the combined quantity would exceed the
    /// product's last-known stock. On a successful merge the line keeps the
    /// fresher snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity and
    /// [`CartError::InsufficientStock`] when stock is exceeded.
    pub fn add(&mut self, product: ProductSnapshot, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let carried = self
            .line(&product.id)
            .map_or(0, |line| line.quantity);
        let requested = carried.saturating_add(quantity);
        if requested > product.stock_quantity {
            return Err(CartError::InsufficientStock {
                requested,
                available: product.stock_quantity,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = requested;
            line.product = product;
        } else {
            self.lines.push(CartLine {
                product_id: product.id.clone(),
                product,
                quantity,
            });
        }
        Ok(())
    }

    /// Remove a product's line entirely. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        self.lines.len() != before
    }

    /// Overwrite a line's quantity. A quantity of zero removes the line.
    ///
    /// Setting a quantity on a product that is not in the cart is a no-op.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of price x quantity across all lines.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, price: u64, stock: u32) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("product {id}"),
            price: Price::from_rupees(price),
            category: Category::Rice,
            unit: "kg".to_owned(),
            stock_quantity: stock,
            image_url: None,
        }
    }

    #[test]
    fn test_add_merges_existing_line() {
        let mut cart = Cart::new();
        cart.add(snapshot("p1", 120, 10), 3).expect("first add");
        cart.add(snapshot("p1", 120, 10), 2).expect("second add");

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&ProductId::new("p1")).map(|l| l.quantity), Some(5));
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_add_rejects_over_stock_without_mutating() {
        let mut cart = Cart::new();
        cart.add(snapshot("p1", 120, 4), 3).expect("add within stock");

        // 3 carted + 2 more > 4 in stock
        let err = cart.add(snapshot("p1", 120, 4), 2).expect_err("over stock");
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 5,
                available: 4
            }
        ));
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add(snapshot("p1", 120, 10), 0),
            Err(CartError::ZeroQuantity)
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(snapshot("p1", 120, 10), 3).expect("add");
        cart.set_quantity(&ProductId::new("p1"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let mut cart = Cart::new();
        cart.add(snapshot("p1", 120, 10), 3).expect("add");
        cart.set_quantity(&ProductId::new("p1"), 7);
        assert_eq!(cart.total_items(), 7);
    }

    #[test]
    fn test_totals_recompute_after_each_mutation() {
        let mut cart = Cart::new();
        cart.add(snapshot("p1", 120, 10), 2).expect("add p1");
        cart.add(snapshot("p2", 80, 10), 1).expect("add p2");
        assert_eq!(cart.total_amount(), Price::from_rupees(320));

        cart.set_quantity(&ProductId::new("p1"), 1);
        assert_eq!(cart.total_amount(), Price::from_rupees(200));

        cart.remove(&ProductId::new("p2"));
        assert_eq!(cart.total_amount(), Price::from_rupees(120));

        cart.clear();
        assert_eq!(cart.total_amount(), Price::ZERO);
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_from_stored_round_trip() {
        let mut cart = Cart::new();
        cart.add(snapshot("p1", 120, 10), 2).expect("add");

        let payload = serde_json::to_string(&cart).expect("serialize");
        let restored = Cart::from_stored(&payload);
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_from_stored_malformed_yields_empty() {
        assert!(Cart::from_stored("not json at all").is_empty());
        assert!(Cart::from_stored("{\"lines\": 42}").is_empty());
        assert!(Cart::from_stored("").is_empty());
    }
}
