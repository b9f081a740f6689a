//! Product reviews.
//!
//! Reviews live in their own collection and are display data: they never
//! participate in stock logic. Adding a review recomputes the product's
//! average rating and patches it onto the product document, best-effort.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use truesoul_core::{ProductId, ReviewId, UserId};

use crate::backend::{Document, DocumentBackend, collections, decode, encode};
use crate::clock::Clock;
use crate::error::StoreError;
use crate::products::{ProductPatch, ProductStore};

/// A product review.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    /// 1 through 5.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    fn from_doc(doc: &Document) -> Result<Self, StoreError> {
        let body: ReviewBody = decode(doc)?;
        Ok(Self {
            id: ReviewId::new(doc.id.clone()),
            product_id: body.product_id,
            user_id: body.user_id,
            user_name: body.user_name,
            rating: body.rating,
            comment: body.comment,
            created_at: body.created_at,
        })
    }
}

/// The document shape stored in the `reviews` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewBody {
    product_id: ProductId,
    user_id: UserId,
    user_name: String,
    rating: u8,
    comment: String,
    created_at: DateTime<Utc>,
}

/// Fields for submitting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}

/// Store for review documents.
#[derive(Clone)]
pub struct ReviewStore {
    inner: Arc<ReviewStoreInner>,
}

struct ReviewStoreInner {
    backend: Arc<dyn DocumentBackend>,
    clock: Arc<dyn Clock>,
    products: ProductStore,
}

impl ReviewStore {
    /// Create a review store over a document backend.
    #[must_use]
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        clock: Arc<dyn Clock>,
        products: ProductStore,
    ) -> Self {
        Self {
            inner: Arc::new(ReviewStoreInner {
                backend,
                clock,
                products,
            }),
        }
    }

    /// List a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or a document is corrupt.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, StoreError> {
        let docs = self.inner.backend.list(collections::REVIEWS).await?;
        let mut reviews = docs
            .iter()
            .map(Review::from_doc)
            .collect::<Result<Vec<_>, _>>()?;
        reviews.retain(|review| &review.product_id == product_id);
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    /// Submit a review and refresh the product's average rating.
    ///
    /// The rating update on the product document is best-effort: if it
    /// fails, the review itself still stands and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRating`] for a rating outside 1-5, or a
    /// store error if the review write fails.
    #[instrument(skip(self, new), fields(product_id = %new.product_id, rating = new.rating))]
    pub async fn add(&self, new: NewReview) -> Result<Review, StoreError> {
        if !(1..=5).contains(&new.rating) {
            return Err(StoreError::InvalidRating(new.rating));
        }
        // The product must exist before a review can point at it
        self.inner.products.get(&new.product_id).await?;

        let body = ReviewBody {
            product_id: new.product_id.clone(),
            user_id: new.user_id,
            user_name: new.user_name,
            rating: new.rating,
            comment: new.comment,
            created_at: self.inner.clock.now(),
        };
        let doc = self
            .inner
            .backend
            .insert(collections::REVIEWS, encode(&body)?)
            .await?;
        let review = Review::from_doc(&doc)?;

        if let Err(e) = self.refresh_average(&new.product_id).await {
            warn!(product_id = %new.product_id, error = %e, "average rating refresh failed");
        }

        Ok(review)
    }

    /// Recompute and store a product's average rating.
    async fn refresh_average(&self, product_id: &ProductId) -> Result<(), StoreError> {
        let reviews = self.list_for_product(product_id).await?;
        if reviews.is_empty() {
            return Ok(());
        }

        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        let average = f64::from(sum) / reviews.len() as f64;

        self.inner
            .products
            .update(
                product_id,
                ProductPatch {
                    average_rating: Some(average),
                    ..ProductPatch::default()
                },
            )
            .await?;
        Ok(())
    }
}
