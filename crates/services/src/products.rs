//! Product catalog store.
//!
//! Products live in the `products` collection. Listing is cached for five
//! minutes (the cache also feeds the assistant's catalog context) and every
//! mutation invalidates it.
//!
//! [`ProductStore::decrement_stock`] is the atomic primitive the
//! reconciliation workflow is built on: a read-check-write guarded by the
//! document's revision token, retried on conflict, so two concurrent orders
//! can never both take the last unit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use truesoul_core::{Category, Price, ProductId, ProductSnapshot};

use crate::backend::{Document, DocumentBackend, collections, decode, encode};
use crate::clock::Clock;
use crate::error::StoreError;

/// Attempts before a guarded stock write gives up on revision races.
const MAX_CAS_ATTEMPTS: u32 = 5;

const CATALOG_CACHE_KEY: &str = "catalog";
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);

/// A catalog product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    /// Unit label, e.g. "kg" or "liter".
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub average_rating: Option<f64>,
}

impl Product {
    /// The denormalized view carried on cart and order lines.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            category: self.category,
            unit: self.unit.clone(),
            stock_quantity: self.stock_quantity,
            image_url: self.image_url.clone(),
        }
    }

    fn from_doc(doc: &Document) -> Result<Self, StoreError> {
        let body: ProductBody = decode(doc)?;
        Ok(Self {
            id: ProductId::new(doc.id.clone()),
            name: body.name,
            description: body.description,
            price: body.price,
            category: body.category,
            image_url: body.image_url,
            stock_quantity: body.stock_quantity,
            unit: body.unit,
            created_at: body.created_at,
            updated_at: body.updated_at,
            average_rating: body.average_rating,
        })
    }

    fn body(&self) -> ProductBody {
        ProductBody {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            category: self.category,
            image_url: self.image_url.clone(),
            stock_quantity: self.stock_quantity,
            unit: self.unit.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            average_rating: self.average_rating,
        }
    }
}

/// The document shape stored in the `products` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductBody {
    name: String,
    description: String,
    price: Price,
    category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    stock_quantity: u32,
    unit: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    average_rating: Option<f64>,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    pub unit: String,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<Category>,
    pub image_url: Option<Option<String>>,
    pub unit: Option<String>,
    pub average_rating: Option<f64>,
}

/// Store for the product catalog.
#[derive(Clone)]
pub struct ProductStore {
    inner: Arc<ProductStoreInner>,
}

struct ProductStoreInner {
    backend: Arc<dyn DocumentBackend>,
    clock: Arc<dyn Clock>,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl ProductStore {
    /// Create a product store over a document backend.
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentBackend>, clock: Arc<dyn Clock>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ProductStoreInner {
                backend,
                clock,
                cache,
            }),
        }
    }

    /// List the whole catalog, newest first.
    ///
    /// Served from the catalog cache when warm.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or a document is corrupt.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, StoreError> {
        if let Some(catalog) = self.inner.cache.get(CATALOG_CACHE_KEY).await {
            debug!("catalog cache hit");
            return Ok(catalog);
        }

        let docs = self.inner.backend.list(collections::PRODUCTS).await?;
        let mut products = docs
            .iter()
            .map(Product::from_doc)
            .collect::<Result<Vec<_>, _>>()?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let catalog = Arc::new(products);
        self.inner
            .cache
            .insert(CATALOG_CACHE_KEY, Arc::clone(&catalog))
            .await;
        Ok(catalog)
    }

    /// List products in one category, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be listed.
    pub async fn list_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError> {
        let catalog = self.list().await?;
        Ok(catalog
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Product, StoreError> {
        let doc = self
            .inner
            .backend
            .get(collections::PRODUCTS, id.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        Product::from_doc(&doc)
    }

    /// Create a product. Timestamps come from the injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewProduct) -> Result<Product, StoreError> {
        let now = self.inner.clock.now();
        let body = ProductBody {
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            image_url: new.image_url,
            stock_quantity: new.stock_quantity,
            unit: new.unit,
            created_at: now,
            updated_at: now,
            average_rating: None,
        };

        let doc = self
            .inner
            .backend
            .insert(collections::PRODUCTS, encode(&body)?)
            .await?;
        self.invalidate_catalog().await;

        Product::from_doc(&doc)
    }

    /// Apply a partial update, refreshing the update timestamp.
    ///
    /// Retries on revision races so an admin edit cannot silently clobber a
    /// concurrent stock write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the product does not exist, or
    /// [`StoreError::Conflict`] if the revision race persists.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let doc = self
                .inner
                .backend
                .get(collections::PRODUCTS, id.as_str())
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
            let mut product = Product::from_doc(&doc)?;

            if let Some(name) = patch.name.clone() {
                product.name = name;
            }
            if let Some(description) = patch.description.clone() {
                product.description = description;
            }
            if let Some(price) = patch.price {
                product.price = price;
            }
            if let Some(category) = patch.category {
                product.category = category;
            }
            if let Some(image_url) = patch.image_url.clone() {
                product.image_url = image_url;
            }
            if let Some(unit) = patch.unit.clone() {
                product.unit = unit;
            }
            if let Some(average_rating) = patch.average_rating {
                product.average_rating = Some(average_rating);
            }
            product.updated_at = self.inner.clock.now();

            match self
                .inner
                .backend
                .put(
                    collections::PRODUCTS,
                    id.as_str(),
                    encode(&product.body())?,
                    Some(&doc.rev),
                )
                .await
            {
                Ok(_) => {
                    self.invalidate_catalog().await;
                    return Ok(product);
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::Conflict(format!("product {id}")))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        self.inner
            .backend
            .delete(collections::PRODUCTS, id.as_str())
            .await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    /// Overwrite a product's stock quantity.
    ///
    /// This is the plain write used when restoring stock; it carries no
    /// concurrency guarantee, but it refuses to store a negative quantity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidStock`] for a negative quantity and
    /// [`StoreError::NotFound`] for a missing product.
    #[instrument(skip(self), fields(id = %id, quantity))]
    pub async fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<(), StoreError> {
        let quantity =
            u32::try_from(quantity).map_err(|_| StoreError::InvalidStock(quantity))?;

        let doc = self
            .inner
            .backend
            .get(collections::PRODUCTS, id.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        let mut product = Product::from_doc(&doc)?;
        product.stock_quantity = quantity;

        self.inner
            .backend
            .put(
                collections::PRODUCTS,
                id.as_str(),
                encode(&product.body())?,
                None,
            )
            .await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    /// Atomically decrement a product's stock.
    ///
    /// Fails with [`StoreError::InsufficientStock`] when the current stock is
    /// below `amount`, leaving the document untouched. The read-check-write
    /// is guarded by the document revision and retried on conflict, so
    /// concurrent decrements serialize through the store: two orders racing
    /// for the last unit cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock`, `NotFound`, or - after exhausting
    /// retries under heavy contention - `Conflict`.
    #[instrument(skip(self), fields(id = %id, amount))]
    pub async fn decrement_stock(&self, id: &ProductId, amount: u32) -> Result<(), StoreError> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let doc = self
                .inner
                .backend
                .get(collections::PRODUCTS, id.as_str())
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
            let mut product = Product::from_doc(&doc)?;

            if product.stock_quantity < amount {
                return Err(StoreError::InsufficientStock {
                    product: product.name,
                    requested: amount,
                    available: product.stock_quantity,
                });
            }

            product.stock_quantity -= amount;
            product.updated_at = self.inner.clock.now();

            match self
                .inner
                .backend
                .put(
                    collections::PRODUCTS,
                    id.as_str(),
                    encode(&product.body())?,
                    Some(&doc.rev),
                )
                .await
            {
                Ok(_) => {
                    self.invalidate_catalog().await;
                    return Ok(());
                }
                Err(StoreError::Conflict(_)) => {
                    debug!(attempt, "stock decrement lost revision race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::Conflict(format!("product {id}")))
    }

    async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate(CATALOG_CACHE_KEY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn store() -> (ProductStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid"),
        ));
        let backend = Arc::new(MemoryBackend::new());
        (ProductStore::new(backend, Arc::clone(&clock) as _), clock)
    }

    fn new_product(name: &str, price: u64, stock: u32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Price::from_rupees(price),
            category: Category::Rice,
            image_url: None,
            stock_quantity: stock,
            unit: "kg".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (store, _) = store();
        let created = store
            .create(new_product("Basmati", 120, 10))
            .await
            .expect("create");

        let fetched = store.get(&created.id).await.expect("get");
        assert_eq!(fetched, created);
        assert_eq!(fetched.stock_quantity, 10);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let (store, clock) = store();
        store.create(new_product("Older", 90, 5)).await.expect("create");
        clock.advance(chrono::Duration::minutes(5));
        store.create(new_product("Newer", 95, 5)).await.expect("create");

        let catalog = store.list().await.expect("list");
        let names: Vec<_> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_decrement_reduces_stock_and_touches_updated_at() {
        let (store, clock) = store();
        let product = store
            .create(new_product("Basmati", 120, 5))
            .await
            .expect("create");

        clock.advance(chrono::Duration::minutes(1));
        store.decrement_stock(&product.id, 2).await.expect("decrement");

        let fetched = store.get(&product.id).await.expect("get");
        assert_eq!(fetched.stock_quantity, 3);
        assert!(fetched.updated_at > fetched.created_at);
    }

    #[tokio::test]
    async fn test_decrement_insufficient_leaves_stock_unchanged() {
        let (store, _) = store();
        let product = store
            .create(new_product("Basmati", 120, 2))
            .await
            .expect("create");

        let err = store
            .decrement_stock(&product.id, 3)
            .await
            .expect_err("insufficient");
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));

        let fetched = store.get(&product.id).await.expect("get");
        assert_eq!(fetched.stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_decrement_missing_product() {
        let (store, _) = store();
        let result = store
            .decrement_stock(&ProductId::new("ghost"), 1)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_stock_rejects_negative() {
        let (store, _) = store();
        let product = store
            .create(new_product("Basmati", 120, 5))
            .await
            .expect("create");

        let err = store.set_stock(&product.id, -1).await.expect_err("negative");
        assert!(matches!(err, StoreError::InvalidStock(-1)));

        let fetched = store.get(&product.id).await.expect("get");
        assert_eq!(fetched.stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_set_stock_overwrites() {
        let (store, _) = store();
        let product = store
            .create(new_product("Basmati", 120, 5))
            .await
            .expect("create");

        store.set_stock(&product.id, 42).await.expect("set");
        let fetched = store.get(&product.id).await.expect("get");
        assert_eq!(fetched.stock_quantity, 42);
    }

    #[tokio::test]
    async fn test_update_patches_fields_and_refreshes_timestamp() {
        let (store, clock) = store();
        let product = store
            .create(new_product("Basmati", 120, 5))
            .await
            .expect("create");

        clock.advance(chrono::Duration::minutes(1));
        let updated = store
            .update(
                &product.id,
                ProductPatch {
                    price: Some(Price::from_rupees(130)),
                    description: Some("premium long grain".to_owned()),
                    ..ProductPatch::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.price, Price::from_rupees(130));
        assert_eq!(updated.description, "premium long grain");
        assert_eq!(updated.name, "Basmati");
        assert!(updated.updated_at > updated.created_at);
    }

    #[tokio::test]
    async fn test_list_by_category_filters() {
        let (store, _) = store();
        store.create(new_product("Basmati", 120, 5)).await.expect("create");
        store
            .create(NewProduct {
                category: Category::Groundnuts,
                ..new_product("Raw Groundnuts", 80, 10)
            })
            .await
            .expect("create");

        let rice = store.list_by_category(Category::Rice).await.expect("list");
        assert_eq!(rice.len(), 1);
        assert_eq!(rice.first().map(|p| p.name.as_str()), Some("Basmati"));
    }

    #[tokio::test]
    async fn test_concurrent_decrements_of_last_unit() {
        let (store, _) = store();
        let product = store
            .create(new_product("Basmati", 120, 1))
            .await
            .expect("create");

        let a = store.clone();
        let b = store.clone();
        let id_a = product.id.clone();
        let id_b = product.id.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { a.decrement_stock(&id_a, 1).await }),
            tokio::spawn(async move { b.decrement_stock(&id_b, 1).await }),
        );

        let outcomes = [ra.expect("join"), rb.expect("join")];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one decrement may win the last unit");

        let fetched = store.get(&product.id).await.expect("get");
        assert_eq!(fetched.stock_quantity, 0);
    }
}
