//! Category CRUD endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use till_core::validation::validate_name;
use till_core::Category;
use till_store::{CategoryUpdate, NewCategory};

use crate::error::ApiError;
use crate::state::AppState;

/// Body for create and full-replace update.
#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CategoryBody {
    fn validated(self) -> Result<Self, ApiError> {
        validate_name(&self.name)?;
        Ok(self)
    }
}

/// GET /api/v1/categories
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.store.list_categories().await?))
}

/// GET /api/v1/categories/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.store.get_category(id).await?))
}

/// POST /api/v1/categories — 201 with the fresh row.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let body = body.validated()?;
    let category = state
        .store
        .create_category(NewCategory {
            name: body.name,
            description: body.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/v1/categories/{id} — full replace.
#[tracing::instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<Category>, ApiError> {
    let body = body.validated()?;
    let category = state
        .store
        .update_category(
            id,
            CategoryUpdate {
                name: body.name,
                description: body.description,
            },
        )
        .await?;
    Ok(Json(category))
}

/// DELETE /api/v1/categories/{id} — soft delete, 204.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
