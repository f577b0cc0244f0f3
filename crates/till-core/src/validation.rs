//! # Validation Module
//!
//! Input validation rules for Till.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (axum extractors)                                       │
//! │  ├── JSON shape and type checks (deserialization)                      │
//! │  └── Date parsing for report windows                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - Business rule validation                       │
//! │  ├── Cart rules (non-empty, positive quantities)                       │
//! │  └── Catalog input rules (names, prices, stock)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite constraints / in-memory checks)                │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  A cart that fails here never reaches the store.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::types::CartItem;
//! use till_core::validation::{validate_cart, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! validate_cart(&[CartItem { product_id: 1, quantity: 2 }]).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::CartItem;
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a single cart quantity.
///
/// ## Rules
/// - Must be positive (> 0); there is no upper cap. A huge quantity is
///   the stock check's problem, not validation's.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a whole checkout cart before any store access.
///
/// ## Rules
/// - Cart must not be empty
/// - Every quantity must pass [`validate_quantity`]
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /checkout {"items": [...]}                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_cart(items) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── empty? → Error: "items is required"                          │
/// │       │                                                                 │
/// │       ├── any qty <= 0? → Error: "quantity must be positive"           │
/// │       │                                                                 │
/// │       └── OK → CheckoutEngine opens the unit of work                   │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Note: a duplicate product id in the cart is legal. The checkout engine
/// processes the occurrences in order against the same held row.
pub fn validate_cart(items: &[CartItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for item in items {
        validate_quantity(item.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a category or product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most MAX_NAME_LEN (200) characters
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_name;
///
/// assert!(validate_name("Cola 330ml").is_ok());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // $10.99
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err()); // Invalid
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price_cents".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level set through the catalog (create/restock).
///
/// ## Rules
/// - Must be non-negative (>= 0); checkout is the only path that may
///   observe stock relative to a requested quantity
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: i64, quantity: i64) -> CartItem {
        CartItem {
            product_id,
            quantity,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());
        // No upper cap: a bulk order stands or falls on stock alone
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(i64::MAX).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_cart_rejects_empty() {
        let err = validate_cart(&[]).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_validate_cart_rejects_bad_quantity_anywhere() {
        // A zero quantity fails the whole cart even when other items are fine
        let cart = vec![item(1, 2), item(2, 0), item(3, 5)];
        let err = validate_cart(&cart).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));

        let cart = vec![item(1, 2), item(2, -3)];
        assert!(validate_cart(&cart).is_err());
    }

    #[test]
    fn test_validate_cart_allows_large_carts() {
        let cart: Vec<CartItem> = (0..500).map(|i| item(i, 1)).collect();
        assert!(validate_cart(&cart).is_ok());
    }

    #[test]
    fn test_validate_cart_allows_duplicates() {
        let cart = vec![item(1, 2), item(1, 3)];
        assert!(validate_cart(&cart).is_ok());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Cola 330ml").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(50).is_ok());
        assert!(validate_stock(-1).is_err());
    }
}
