//! # Domain Types
//!
//! Core types shared across the store, the engines, and the HTTP server.
//!
//! ## Type Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Domain Model                                     │
//! │                                                                         │
//! │  Category ◄────────── Product                                           │
//! │  (optional)             │                                               │
//! │                         │ referenced by id, name snapshotted            │
//! │                         ▼                                               │
//! │  CartItem ──checkout──► LedgerLine ──────► LedgerEntry                  │
//! │  (request)              (quantity,         (total, timestamp,          │
//! │                          subtotal)          lines)                      │
//! │                                                │                        │
//! │                                                ▼                        │
//! │                              ReportSummary (revenue, count,             │
//! │                                             best seller)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A ledger line references its product by id and carries the product
//! name as it was at sale time. Later renames or deletions of the product
//! never rewrite committed history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
///
/// Soft deletion is a storage concern: a deleted category simply stops
/// appearing here. The type itself has no `deleted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Unit price in minor currency units. Integer end to end.
    pub price_cents: i64,
    /// Units currently on hand. Decremented by checkout, set by restock.
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Joined from the category at read time; absent when the product is
    /// uncategorized or its category was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as [`Money`].
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// One requested item in a checkout cart.
///
/// ## Example
/// ```rust
/// use till_core::types::CartItem;
///
/// let item = CartItem { product_id: 7, quantity: 2 };
/// assert_eq!(item.quantity, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// A committed sale: the ledger header plus its lines.
///
/// ## Immutability
/// Once committed, a ledger entry is never updated or deleted. The id and
/// `created_at` are assigned by the store inside the checkout's unit of
/// work; the same timestamp lives in the row and in this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<LedgerLine>,
}

impl LedgerEntry {
    /// Returns the entry total as [`Money`].
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One sold product within a ledger entry.
///
/// The unit price is not stored; the computed subtotal is. `product_name`
/// is a sale-time snapshot carried on the response, not persisted with
/// the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: i64,
    pub entry_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

impl LedgerLine {
    /// Returns the line subtotal as [`Money`].
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// The product that sold the most units inside a report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestSeller {
    pub name: String,
    pub quantity: i64,
}

impl BestSeller {
    /// Sentinel for a window with no sales: `("-", 0)`.
    pub fn none() -> Self {
        BestSeller {
            name: "-".to_string(),
            quantity: 0,
        }
    }
}

/// Aggregated sales figures over a half-open `[start, end)` window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Sum of entry totals in the window, in minor units. 0 when empty.
    pub revenue_cents: i64,
    /// Number of ledger entries in the window.
    pub transaction_count: i64,
    pub best_seller: BestSeller,
}

impl ReportSummary {
    /// Returns the window revenue as [`Money`].
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_seller_sentinel() {
        let sentinel = BestSeller::none();
        assert_eq!(sentinel.name, "-");
        assert_eq!(sentinel.quantity, 0);
    }

    #[test]
    fn test_product_omits_absent_category_fields() {
        let product = Product {
            id: 1,
            name: "Widget".to_string(),
            description: String::new(),
            price_cents: 500,
            stock: 10,
            category_id: None,
            category_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("category_id").is_none());
        assert!(json.get("category_name").is_none());
        assert_eq!(json["price_cents"], 500);
    }

    #[test]
    fn test_cart_item_json_shape() {
        let item: CartItem = serde_json::from_str(r#"{"product_id":7,"quantity":2}"#).unwrap();
        assert_eq!(item.product_id, 7);
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_money_accessors() {
        let entry = LedgerEntry {
            id: 1,
            total_cents: 1897,
            created_at: Utc::now(),
            lines: vec![LedgerLine {
                id: 1,
                entry_id: 1,
                product_id: 7,
                product_name: "Widget".to_string(),
                quantity: 3,
                subtotal_cents: 897,
            }],
        };

        assert_eq!(entry.total(), Money::from_cents(1897));
        assert_eq!(entry.lines[0].subtotal(), Money::from_cents(897));
    }
}
