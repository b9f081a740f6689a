//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use truesoul_core::{Category, ProductId};
use truesoul_services::products::Product;
use truesoul_services::reviews::{NewReview, Review};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: truesoul_core::Price,
    pub price_display: String,
    pub category: Category,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    pub unit: String,
    pub average_rating: Option<f64>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            price_display: product.price.to_string(),
            category: product.category,
            image_url: product.image_url.clone(),
            stock_quantity: product.stock_quantity,
            unit: product.unit.clone(),
            average_rating: product.average_rating,
        }
    }
}

/// Review display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: truesoul_core::ReviewId,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: review.created_at,
        }
    }
}

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional category label, matched case-insensitively.
    pub category: Option<String>,
}

/// List the catalog, optionally filtered by category.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let products = match query.category.as_deref() {
        Some(label) => {
            let category: Category = label
                .parse()
                .map_err(|_| AppError::BadRequest(format!("unknown category: {label}")))?;
            state.products().list_by_category(category).await?
        }
        None => state.products().list().await?.as_ref().clone(),
    };

    Ok(Json(products.iter().map(ProductView::from).collect()))
}

/// Fetch one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = state.products().get(&id).await?;
    Ok(Json(ProductView::from(&product)))
}

/// List a product's reviews, newest first.
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ReviewView>>> {
    // Listing reviews of a missing product is a 404, not an empty list
    state.products().get(&id).await?;
    let reviews = state.reviews().list_for_product(&id).await?;
    Ok(Json(reviews.iter().map(ReviewView::from).collect()))
}

/// Form data for submitting a review.
#[derive(Debug, Deserialize)]
pub struct AddReviewForm {
    pub rating: u8,
    pub comment: String,
}

/// Submit a review for a product.
#[instrument(skip(state, user, form), fields(product_id = %id))]
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<AddReviewForm>,
) -> Result<Json<ReviewView>> {
    let review = state
        .reviews()
        .add(NewReview {
            product_id: id,
            user_id: user.uid,
            user_name: user.display_name.unwrap_or(user.email),
            rating: form.rating,
            comment: form.comment,
        })
        .await?;
    Ok(Json(ReviewView::from(&review)))
}
