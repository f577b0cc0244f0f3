//! # Checkout Error Taxonomy
//!
//! The errors a checkout can surface, distinguishable so callers can
//! present actionable messages.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Error Taxonomy                             │
//! │                                                                         │
//! │  Validation(..)            ← cart rejected before any store access     │
//! │  NotFound(product_id)      ← a cart item references no live product    │
//! │  InsufficientStock(..)     ← available < requested, both carried       │
//! │  Store(..)                 ← collaborator I/O failure, fatal to the    │
//! │                              request but not to the process            │
//! │                                                                         │
//! │  All four abort the whole unit of work. The first three map to        │
//! │  client-facing responses (400 / 404 / 409); Store maps to 500.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use till_core::ValidationError;
use till_store::StoreError;

/// Errors surfaced by [`CheckoutEngine`](crate::CheckoutEngine).
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart failed validation; the store was never touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A cart item references a product that does not exist (or is
    /// soft-deleted, which checkout cannot tell apart).
    #[error("product {product_id} not found")]
    NotFound { product_id: i64 },

    /// Not enough stock. Carries both figures for display: the
    /// `available` value is the stock actually observed under the
    /// exclusive hold, so under contention it reflects the stock left
    /// by whichever competing checkout committed first.
    #[error(
        "insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// The store failed to read, write, or commit. Not retried here;
    /// retry is caller policy.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_carries_figures() {
        let err = CheckoutError::InsufficientStock {
            product_id: 7,
            available: 4,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for product 7: available 4, requested 5"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: CheckoutError = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(err.to_string(), "items is required");
    }
}
