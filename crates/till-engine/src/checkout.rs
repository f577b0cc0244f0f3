//! # Checkout Engine
//!
//! Atomically converts a cart into a committed ledger entry.
//!
//! ## The Checkout Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(items)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_cart ── fail ──► ValidationError (store never touched)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.begin_checkout() ── one atomic unit of work ─────────────┐      │
//! │       │                                                          │      │
//! │       ▼  for each item, in caller order:                         │      │
//! │  lock_product(id) ── None ──► NotFound ──────────────► rollback │      │
//! │       │                                                          │      │
//! │  stock < qty? ──► InsufficientStock(avail, req) ─────► rollback │      │
//! │       │                                                          │      │
//! │  subtotal = price × qty; total += subtotal                       │      │
//! │  write_stock(stock - qty); stage the line                        │      │
//! │       │                                                          │      │
//! │       ▼  all items passed:                                       │      │
//! │  insert_header(total) ──► (id, created_at)                       │      │
//! │  insert_line(...) per staged line                                │      │
//! │       │                                                          │      │
//! │       ▼                                                          │      │
//! │  commit ──► LedgerEntry ◄────────────────────────────────────────┘      │
//! │                                                                         │
//! │  Abort on the FIRST failing item. No best-effort partial               │
//! │  fulfillment: a cart fully succeeds or fully fails.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `lock_product` acquires the backend's exclusive hold, so a competing
//! checkout of the same product observes this one's committed stock or
//! its rollback, never an interleaving (see the till-store docs for how
//! each backend provides the hold).

use std::sync::Arc;

use tracing::{debug, info};

use till_core::validation::validate_cart;
use till_core::{CartItem, LedgerEntry, LedgerLine, Money, ValidationError};
use till_store::Store;

use crate::error::{CheckoutError, CheckoutResult};

fn amount_overflow(field: &str) -> CheckoutError {
    CheckoutError::Validation(ValidationError::AmountOverflow {
        field: field.to_string(),
    })
}

/// A ledger line staged in memory until the header id exists.
struct PendingLine {
    product_id: i64,
    product_name: String,
    quantity: i64,
    subtotal: Money,
}

/// The checkout engine.
///
/// Cheap to clone; receives its store at construction (no globals).
///
/// ## Example
/// ```rust,ignore
/// let engine = CheckoutEngine::new(store.clone());
/// let entry = engine
///     .checkout(&[CartItem { product_id: 1, quantity: 2 }])
///     .await?;
/// ```
#[derive(Clone)]
pub struct CheckoutEngine {
    store: Arc<dyn Store>,
}

impl CheckoutEngine {
    /// Creates a checkout engine over a store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        CheckoutEngine { store }
    }

    /// Converts a cart into a committed [`LedgerEntry`].
    ///
    /// All-or-nothing: on any failure — validation, unknown product,
    /// insufficient stock, store error — no stock changes and no ledger
    /// rows persist. Items are processed in caller order; the first
    /// failing item aborts the whole cart.
    ///
    /// Duplicate product ids are legal: the second occurrence observes
    /// the stock already decremented by the first within the same unit
    /// of work.
    pub async fn checkout(&self, items: &[CartItem]) -> CheckoutResult<LedgerEntry> {
        // Rejected carts never touch the store
        validate_cart(items)?;

        debug!(items = items.len(), "opening checkout");
        let mut tx = self.store.begin_checkout().await?;

        let mut total = Money::zero();
        let mut pending: Vec<PendingLine> = Vec::with_capacity(items.len());

        for item in items {
            // The read takes the exclusive hold on this product row for
            // the rest of the unit of work
            let product = tx
                .lock_product(item.product_id)
                .await?
                .ok_or(CheckoutError::NotFound {
                    product_id: item.product_id,
                })?;

            if product.stock < item.quantity {
                // tx drops here and rolls back, including any stock
                // writes from earlier items in this cart
                return Err(CheckoutError::InsufficientStock {
                    product_id: item.product_id,
                    available: product.stock,
                    requested: item.quantity,
                });
            }

            // Prices and quantities are only bounded below, so the
            // amount math is checked; an overflowing cart aborts (and
            // rolls back) instead of wrapping into the ledger
            let subtotal = product
                .price()
                .checked_mul(item.quantity)
                .ok_or_else(|| amount_overflow("subtotal"))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| amount_overflow("total"))?;

            tx.write_stock(item.product_id, product.stock - item.quantity)
                .await?;

            pending.push(PendingLine {
                product_id: item.product_id,
                product_name: product.name,
                quantity: item.quantity,
                subtotal,
            });
        }

        // Every item passed: header first (for its id), then the lines
        let (entry_id, created_at) = tx.insert_header(total.cents()).await?;

        let mut lines = Vec::with_capacity(pending.len());
        for line in pending {
            let line_id = tx
                .insert_line(entry_id, line.product_id, line.quantity, line.subtotal.cents())
                .await?;
            lines.push(LedgerLine {
                id: line_id,
                entry_id,
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                subtotal_cents: line.subtotal.cents(),
            });
        }

        tx.commit().await?;

        info!(
            entry_id,
            total = %total,
            lines = lines.len(),
            "checkout committed"
        );

        Ok(LedgerEntry {
            id: entry_id,
            total_cents: total.cents(),
            created_at,
            lines,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
//
// Every scenario runs against both backends through the same helper;
// the engine must not be able to tell them apart.

#[cfg(test)]
mod tests {
    use super::*;

    use till_core::ValidationError;
    use till_store::{DbConfig, MemoryStore, NewProduct, SqliteStore};

    fn item(product_id: i64, quantity: i64) -> CartItem {
        CartItem {
            product_id,
            quantity,
        }
    }

    /// Both backends, same contract.
    async fn backends() -> Vec<Arc<dyn Store>> {
        vec![
            Arc::new(MemoryStore::new()),
            Arc::new(SqliteStore::connect(DbConfig::in_memory()).await.unwrap()),
        ]
    }

    async fn seed(store: &Arc<dyn Store>, name: &str, price_cents: i64, stock: i64) -> i64 {
        store
            .create_product(NewProduct {
                name: name.to_string(),
                description: String::new(),
                price_cents,
                stock,
                category_id: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_single_item_checkout() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 10).await;
            let engine = CheckoutEngine::new(store.clone());

            let entry = engine.checkout(&[item(id, 1)]).await.unwrap();

            assert_eq!(entry.total_cents, 100);
            assert_eq!(entry.lines.len(), 1);
            assert_eq!(entry.lines[0].product_id, id);
            assert_eq!(entry.lines[0].product_name, "Cola");
            assert_eq!(entry.lines[0].subtotal_cents, 100);
            assert_eq!(entry.lines[0].entry_id, entry.id);

            assert_eq!(store.get_product(id).await.unwrap().stock, 9);
        }
    }

    #[tokio::test]
    async fn test_multi_item_total_is_sum_of_subtotals() {
        for store in backends().await {
            let cola = seed(&store, "Cola", 100, 10).await;
            let juice = seed(&store, "Juice", 250, 8).await;
            let engine = CheckoutEngine::new(store.clone());

            let entry = engine
                .checkout(&[item(cola, 3), item(juice, 2)])
                .await
                .unwrap();

            // Conservation: total == Σ subtotal, subtotal == price × qty
            assert_eq!(entry.lines[0].subtotal_cents, 300);
            assert_eq!(entry.lines[1].subtotal_cents, 500);
            assert_eq!(
                entry.total_cents,
                entry.lines.iter().map(|l| l.subtotal_cents).sum::<i64>()
            );

            assert_eq!(store.get_product(cola).await.unwrap().stock, 7);
            assert_eq!(store.get_product(juice).await.unwrap().stock, 6);
        }
    }

    #[tokio::test]
    async fn test_empty_cart_is_validation_error() {
        for store in backends().await {
            let engine = CheckoutEngine::new(store);
            let err = engine.checkout(&[]).await.unwrap_err();
            assert!(matches!(
                err,
                CheckoutError::Validation(ValidationError::Required { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected_before_store() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 10).await;
            let engine = CheckoutEngine::new(store.clone());

            for qty in [0, -1] {
                let err = engine.checkout(&[item(id, qty)]).await.unwrap_err();
                assert!(matches!(err, CheckoutError::Validation(_)));
            }
            assert_eq!(store.get_product(id).await.unwrap().stock, 10);
        }
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        for store in backends().await {
            let engine = CheckoutEngine::new(store);
            let err = engine.checkout(&[item(999, 1)]).await.unwrap_err();
            assert!(matches!(
                err,
                CheckoutError::NotFound { product_id: 999 }
            ));
        }
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_not_found() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 10).await;
            store.delete_product(id).await.unwrap();

            let engine = CheckoutEngine::new(store);
            let err = engine.checkout(&[item(id, 1)]).await.unwrap_err();
            assert!(matches!(err, CheckoutError::NotFound { .. }));
        }
    }

    #[tokio::test]
    async fn test_insufficient_stock_carries_figures() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 9).await;
            let engine = CheckoutEngine::new(store.clone());

            let err = engine.checkout(&[item(id, 20)]).await.unwrap_err();
            match err {
                CheckoutError::InsufficientStock {
                    product_id,
                    available,
                    requested,
                } => {
                    assert_eq!(product_id, id);
                    assert_eq!(available, 9);
                    assert_eq!(requested, 20);
                }
                other => panic!("expected InsufficientStock, got {other:?}"),
            }

            assert_eq!(store.get_product(id).await.unwrap().stock, 9);
        }
    }

    #[tokio::test]
    async fn test_exact_stock_succeeds_to_zero() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 5).await;
            let engine = CheckoutEngine::new(store.clone());

            engine.checkout(&[item(id, 5)]).await.unwrap();
            assert_eq!(store.get_product(id).await.unwrap().stock, 0);
        }
    }

    #[tokio::test]
    async fn test_later_failure_rolls_back_earlier_items() {
        for store in backends().await {
            let cola = seed(&store, "Cola", 100, 10).await;
            let juice = seed(&store, "Juice", 250, 1).await;
            let engine = CheckoutEngine::new(store.clone());

            // First item fits, second doesn't: the whole cart fails
            let err = engine
                .checkout(&[item(cola, 3), item(juice, 2)])
                .await
                .unwrap_err();
            assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

            // Atomicity: the cola decrement did not survive
            assert_eq!(store.get_product(cola).await.unwrap().stock, 10);
            assert_eq!(store.get_product(juice).await.unwrap().stock, 1);
        }
    }

    #[tokio::test]
    async fn test_duplicate_item_observes_own_decrement() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 5).await;
            let engine = CheckoutEngine::new(store.clone());

            // 3 + 3 exceeds stock 5 even though each alone would fit
            let err = engine
                .checkout(&[item(id, 3), item(id, 3)])
                .await
                .unwrap_err();
            match err {
                CheckoutError::InsufficientStock { available, .. } => assert_eq!(available, 2),
                other => panic!("expected InsufficientStock, got {other:?}"),
            }
            assert_eq!(store.get_product(id).await.unwrap().stock, 5);

            // 3 + 2 exactly drains it
            let entry = engine.checkout(&[item(id, 3), item(id, 2)]).await.unwrap();
            assert_eq!(entry.total_cents, 500);
            assert_eq!(store.get_product(id).await.unwrap().stock, 0);
        }
    }

    #[tokio::test]
    async fn test_bulk_quantity_stands_on_stock_alone() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 1500).await;
            let engine = CheckoutEngine::new(store.clone());

            // No per-item quantity cap: 1000 is a stock question
            let entry = engine.checkout(&[item(id, 1000)]).await.unwrap();
            assert_eq!(entry.total_cents, 100_000);
            assert_eq!(store.get_product(id).await.unwrap().stock, 500);

            // And a bulk cart over remaining stock fails the stock
            // check, not validation
            let err = engine.checkout(&[item(id, 1000)]).await.unwrap_err();
            assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        }
    }

    #[tokio::test]
    async fn test_amount_overflow_aborts_instead_of_wrapping() {
        for store in backends().await {
            let id = seed(&store, "Bullion", i64::MAX, 10).await;
            let engine = CheckoutEngine::new(store.clone());

            let err = engine.checkout(&[item(id, 2)]).await.unwrap_err();
            assert!(matches!(
                err,
                CheckoutError::Validation(ValidationError::AmountOverflow { .. })
            ));

            // The abort rolled back: no stock moved, no entry committed
            assert_eq!(store.get_product(id).await.unwrap().stock, 10);
        }
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_serialize() {
        for store in backends().await {
            let id = seed(&store, "Cola", 100, 9).await;
            let engine = CheckoutEngine::new(store.clone());

            // Two concurrent carts each want 5 of a stock of 9: exactly
            // one may succeed
            let a = {
                let engine = engine.clone();
                tokio::spawn(async move { engine.checkout(&[item(id, 5)]).await })
            };
            let b = {
                let engine = engine.clone();
                tokio::spawn(async move { engine.checkout(&[item(id, 5)]).await })
            };

            let (a, b) = (a.await.unwrap(), b.await.unwrap());
            let (winner, loser) = match (a, b) {
                (Ok(entry), Err(err)) | (Err(err), Ok(entry)) => (entry, err),
                (Ok(_), Ok(_)) => panic!("both checkouts succeeded: lost update"),
                (Err(a), Err(b)) => panic!("both checkouts failed: {a:?} / {b:?}"),
            };

            assert_eq!(winner.total_cents, 500);
            match loser {
                // available=4 when the loser locked after the winner's
                // commit; available is never the stale 9-with-success
                CheckoutError::InsufficientStock {
                    available,
                    requested,
                    ..
                } => {
                    assert_eq!(available, 4);
                    assert_eq!(requested, 5);
                }
                other => panic!("expected InsufficientStock, got {other:?}"),
            }

            assert_eq!(store.get_product(id).await.unwrap().stock, 4);
        }
    }
}
