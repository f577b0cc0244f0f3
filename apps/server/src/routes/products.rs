//! Product CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use till_core::validation::{validate_name, validate_price_cents, validate_stock};
use till_core::Product;
use till_store::{NewProduct, ProductUpdate};

use crate::error::ApiError;
use crate::state::AppState;

/// Body for create and full-replace update. Updating `stock` here is
/// the restock path.
#[derive(Debug, Deserialize)]
pub struct ProductBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl ProductBody {
    fn validated(self) -> Result<Self, ApiError> {
        validate_name(&self.name)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring match on the product name.
    pub name: Option<String>,
}

/// GET /api/v1/products?name=cola
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products(params.name.as_deref()).await?;
    Ok(Json(products))
}

/// GET /api/v1/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.store.get_product(id).await?))
}

/// POST /api/v1/products — 201 with the fresh row.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let body = body.validated()?;
    let product = state
        .store
        .create_product(NewProduct {
            name: body.name,
            description: body.description,
            price_cents: body.price_cents,
            stock: body.stock,
            category_id: body.category_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products/{id} — full replace, including stock.
#[tracing::instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Product>, ApiError> {
    let body = body.validated()?;
    let product = state
        .store
        .update_product(
            id,
            ProductUpdate {
                name: body.name,
                description: body.description,
                price_cents: body.price_cents,
                stock: body.stock,
                category_id: body.category_id,
            },
        )
        .await?;
    Ok(Json(product))
}

/// DELETE /api/v1/products/{id} — soft delete, 204. The product
/// becomes invisible to checkout immediately.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
