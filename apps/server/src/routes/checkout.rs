//! Checkout endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use till_core::{CartItem, LedgerEntry};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// POST /api/v1/checkout — the whole cart commits or nothing does.
///
/// `201` with the committed ledger entry; `400` for an invalid cart,
/// `404` for an unknown product, `409` when stock is insufficient
/// (message carries available vs requested), `500` for store failures.
#[tracing::instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    let entry = state.checkout.checkout(&req.items).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
