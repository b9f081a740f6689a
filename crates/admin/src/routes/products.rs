//! Catalog management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use truesoul_core::{Category, Price, ProductId};
use truesoul_services::products::{NewProduct, Product, ProductPatch};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Product data as returned to the admin client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    pub unit: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub average_rating: Option<f64>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category,
            image_url: product.image_url.clone(),
            stock_quantity: product.stock_quantity,
            unit: product.unit.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
            average_rating: product.average_rating,
        }
    }
}

/// Form data for creating a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductForm {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Category,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    pub unit: String,
}

/// Form data for updating a product. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<Category>,
    pub image_url: Option<Option<String>>,
    pub unit: Option<String>,
}

/// Form data for an absolute stock write.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStockForm {
    pub stock_quantity: i64,
}

/// List the whole catalog.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ProductView>>> {
    let products = state.products().list().await?;
    Ok(Json(products.iter().map(ProductView::from).collect()))
}

/// Create a product.
#[instrument(skip(state, _admin, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(form): Json<CreateProductForm>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let price = Price::new(form.price).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let product = state
        .products()
        .create(NewProduct {
            name: form.name,
            description: form.description,
            price,
            category: form.category,
            image_url: form.image_url,
            stock_quantity: form.stock_quantity,
            unit: form.unit,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ProductView::from(&product))))
}

/// Apply a partial update to a product.
#[instrument(skip(state, _admin, form), fields(id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(form): Json<UpdateProductForm>,
) -> Result<Json<ProductView>> {
    let price = form
        .price
        .map(Price::new)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let product = state
        .products()
        .update(
            &id,
            ProductPatch {
                name: form.name,
                description: form.description,
                price,
                category: form.category,
                image_url: form.image_url,
                unit: form.unit,
                average_rating: None,
            },
        )
        .await?;
    Ok(Json(ProductView::from(&product)))
}

/// Delete a product.
#[instrument(skip(state, _admin), fields(id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    // Surface a 404 for unknown ids instead of silently succeeding
    state.products().get(&id).await?;
    state.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Overwrite a product's stock quantity.
#[instrument(skip(state, _admin, form), fields(id = %id))]
pub async fn set_stock(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(form): Json<SetStockForm>,
) -> Result<Json<ProductView>> {
    state.products().set_stock(&id, form.stock_quantity).await?;
    let product = state.products().get(&id).await?;
    Ok(Json(ProductView::from(&product)))
}
