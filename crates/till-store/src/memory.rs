//! # In-Memory Store
//!
//! The in-memory backend: BTreeMaps behind one async mutex.
//!
//! ## Exclusivity Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  MemoryStore Concurrency                                │
//! │                                                                         │
//! │  Arc<Mutex<MemoryState>>                                               │
//! │       │                                                                 │
//! │       ├── CRUD / report read ──► lock().await, do the work, release    │
//! │       │                                                                 │
//! │       └── begin_checkout() ───► lock_owned().await                     │
//! │                │                                                        │
//! │                ▼                                                        │
//! │          MemoryCheckout holds the OwnedMutexGuard for its whole        │
//! │          lifetime. Every other store operation — and every other       │
//! │          checkout — blocks until commit() or drop.                     │
//! │                                                                         │
//! │          That guard IS the exclusive hold of the design: a second      │
//! │          checkout of the same product cannot read stock until the      │
//! │          first one's writes are applied (commit) or discarded (drop).  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes inside a checkout are staged on the transaction value and only
//! applied to the shared state at `commit`. Dropping the transaction
//! discards the staging area, which is the whole rollback story.
//!
//! This is coarser than a per-row lock (reports briefly queue behind an
//! open checkout too), which trivially satisfies the no-deadlock
//! requirement for multi-item carts. The trade-off is fine for the
//! backend's intended uses: tests, demos, ephemeral deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use till_core::{BestSeller, Category, Product};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    CategoryUpdate, CheckoutTx, LedgerTotals, LockedProduct, NewCategory, NewProduct,
    ProductUpdate, Store,
};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
struct CategoryRecord {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ProductRecord {
    id: i64,
    name: String,
    description: String,
    price_cents: i64,
    stock: i64,
    category_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct EntryRecord {
    id: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct LineRecord {
    #[allow(dead_code)]
    id: i64,
    entry_id: i64,
    product_id: i64,
    quantity: i64,
    #[allow(dead_code)]
    subtotal_cents: i64,
}

/// Everything the backend knows, under one mutex.
#[derive(Debug, Default)]
struct MemoryState {
    categories: BTreeMap<i64, CategoryRecord>,
    products: BTreeMap<i64, ProductRecord>,
    entries: Vec<EntryRecord>,
    lines: Vec<LineRecord>,
    next_category_id: i64,
    next_product_id: i64,
    next_entry_id: i64,
    next_line_id: i64,
}

impl MemoryState {
    fn category_view(&self, rec: &CategoryRecord) -> Category {
        Category {
            id: rec.id,
            name: rec.name.clone(),
            description: rec.description.clone(),
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        }
    }

    fn product_view(&self, rec: &ProductRecord) -> Product {
        // The joined category name only appears for a live category
        let category_name = rec.category_id.and_then(|cid| {
            self.categories
                .get(&cid)
                .filter(|c| c.deleted_at.is_none())
                .map(|c| c.name.clone())
        });

        Product {
            id: rec.id,
            name: rec.name.clone(),
            description: rec.description.clone(),
            price_cents: rec.price_cents,
            stock: rec.stock,
            category_id: rec.category_id,
            category_name,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        }
    }

    fn live_product_mut(&mut self, id: i64) -> Option<&mut ProductRecord> {
        self.products.get_mut(&id).filter(|p| p.deleted_at.is_none())
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory [`Store`] implementation.
///
/// Same contract as [`SqliteStore`](crate::SqliteStore), nothing durable.
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin_checkout(&self) -> StoreResult<Box<dyn CheckoutTx>> {
        // The guard is the store-wide exclusive hold; see module docs.
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryCheckout {
            state: guard,
            staged_stock: BTreeMap::new(),
            pending_entry: None,
            pending_lines: Vec::new(),
        }))
    }

    async fn ledger_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<LedgerTotals> {
        let state = self.state.lock().await;
        let mut totals = LedgerTotals {
            revenue_cents: 0,
            entry_count: 0,
        };
        for entry in &state.entries {
            if entry.created_at >= start && entry.created_at < end {
                totals.revenue_cents += entry.total_cents;
                totals.entry_count += 1;
            }
        }
        Ok(totals)
    }

    async fn best_seller(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Option<BestSeller>> {
        let state = self.state.lock().await;

        // Sum line quantities per resolved product name across in-window
        // entries. Aggregating by name (not id) merges distinct products
        // that share one, mirroring the SQLite GROUP BY p.name.
        // Purged products have no record left and drop out of the join;
        // soft-deleted ones still resolve.
        let mut by_name: BTreeMap<String, i64> = BTreeMap::new();
        for line in &state.lines {
            let in_window = state
                .entries
                .iter()
                .any(|e| e.id == line.entry_id && e.created_at >= start && e.created_at < end);
            if !in_window {
                continue;
            }
            if let Some(product) = state.products.get(&line.product_id) {
                *by_name.entry(product.name.clone()).or_insert(0) += line.quantity;
            }
        }

        let best = by_name
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(name, quantity)| BestSeller { name, quantity });

        Ok(best)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.deleted_at.is_none())
            .map(|c| state.category_view(c))
            .collect())
    }

    async fn get_category(&self, id: i64) -> StoreResult<Category> {
        let state = self.state.lock().await;
        state
            .categories
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .map(|c| state.category_view(c))
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let mut state = self.state.lock().await;
        state.next_category_id += 1;
        let now = Utc::now();
        let rec = CategoryRecord {
            id: state.next_category_id,
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let view = state.category_view(&rec);
        state.categories.insert(rec.id, rec);
        Ok(view)
    }

    async fn update_category(&self, id: i64, update: CategoryUpdate) -> StoreResult<Category> {
        let mut state = self.state.lock().await;
        let rec = state
            .categories
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found("category", id))?;
        rec.name = update.name;
        rec.description = update.description;
        rec.updated_at = Utc::now();
        let rec = rec.clone();
        Ok(state.category_view(&rec))
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let rec = state
            .categories
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found("category", id))?;
        rec.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn list_products(&self, name_filter: Option<&str>) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        let needle = name_filter.map(str::to_lowercase);
        Ok(state
            .products
            .values()
            .filter(|p| p.deleted_at.is_none())
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n),
                None => true,
            })
            .map(|p| state.product_view(p))
            .collect())
    }

    async fn get_product(&self, id: i64) -> StoreResult<Product> {
        let state = self.state.lock().await;
        state
            .products
            .get(&id)
            .filter(|p| p.deleted_at.is_none())
            .map(|p| state.product_view(p))
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut state = self.state.lock().await;

        // Mirror the SQLite foreign key on category_id
        if let Some(cid) = new.category_id {
            if !state.categories.contains_key(&cid) {
                return Err(StoreError::ForeignKeyViolation {
                    message: format!("category {cid} does not exist"),
                });
            }
        }

        state.next_product_id += 1;
        let now = Utc::now();
        let rec = ProductRecord {
            id: state.next_product_id,
            name: new.name,
            description: new.description,
            price_cents: new.price_cents,
            stock: new.stock,
            category_id: new.category_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let view = state.product_view(&rec);
        state.products.insert(rec.id, rec);
        Ok(view)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> StoreResult<Product> {
        let mut state = self.state.lock().await;

        if let Some(cid) = update.category_id {
            if !state.categories.contains_key(&cid) {
                return Err(StoreError::ForeignKeyViolation {
                    message: format!("category {cid} does not exist"),
                });
            }
        }

        let rec = state
            .live_product_mut(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        rec.name = update.name;
        rec.description = update.description;
        rec.price_cents = update.price_cents;
        rec.stock = update.stock;
        rec.category_id = update.category_id;
        rec.updated_at = Utc::now();
        let rec = rec.clone();
        Ok(state.product_view(&rec))
    }

    async fn delete_product(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let rec = state
            .live_product_mut(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        rec.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn purge_soft_deleted(&self, older_than: Duration) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let cutoff = Utc::now() - older_than;
        let mut removed = 0u64;

        state.products.retain(|_, p| {
            let purge = matches!(p.deleted_at, Some(at) if at < cutoff);
            if purge {
                removed += 1;
            }
            !purge
        });
        state.categories.retain(|_, c| {
            let purge = matches!(c.deleted_at, Some(at) if at < cutoff);
            if purge {
                removed += 1;
            }
            !purge
        });

        debug!(removed, "purged soft-deleted rows");
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        // Taking the lock proves nobody poisoned or wedged the state
        let _state = self.state.lock().await;
        Ok(())
    }
}

// =============================================================================
// MemoryCheckout
// =============================================================================

/// One checkout's unit of work against [`MemoryStore`].
///
/// Holds the state mutex for its whole lifetime; stages every write and
/// applies them in `commit`. Dropping without commit leaves no trace.
struct MemoryCheckout {
    state: OwnedMutexGuard<MemoryState>,
    /// Stock levels written by this checkout, keyed by product id.
    /// `lock_product` reads through this overlay so a duplicate cart
    /// item observes its own earlier decrement.
    staged_stock: BTreeMap<i64, i64>,
    pending_entry: Option<EntryRecord>,
    pending_lines: Vec<LineRecord>,
}

#[async_trait]
impl CheckoutTx for MemoryCheckout {
    async fn lock_product(&mut self, product_id: i64) -> StoreResult<Option<LockedProduct>> {
        let rec = match self
            .state
            .products
            .get(&product_id)
            .filter(|p| p.deleted_at.is_none())
        {
            Some(rec) => rec,
            None => return Ok(None),
        };

        let stock = self
            .staged_stock
            .get(&product_id)
            .copied()
            .unwrap_or(rec.stock);

        Ok(Some(LockedProduct {
            name: rec.name.clone(),
            price_cents: rec.price_cents,
            stock,
        }))
    }

    async fn write_stock(&mut self, product_id: i64, new_stock: i64) -> StoreResult<()> {
        self.staged_stock.insert(product_id, new_stock);
        Ok(())
    }

    async fn insert_header(&mut self, total_cents: i64) -> StoreResult<(i64, DateTime<Utc>)> {
        // Ids advance even on rollback, like AUTOINCREMENT would
        self.state.next_entry_id += 1;
        let entry = EntryRecord {
            id: self.state.next_entry_id,
            total_cents,
            created_at: Utc::now(),
        };
        self.pending_entry = Some(entry);
        Ok((entry.id, entry.created_at))
    }

    async fn insert_line(
        &mut self,
        header_id: i64,
        product_id: i64,
        quantity: i64,
        subtotal_cents: i64,
    ) -> StoreResult<i64> {
        self.state.next_line_id += 1;
        let line = LineRecord {
            id: self.state.next_line_id,
            entry_id: header_id,
            product_id,
            quantity,
            subtotal_cents,
        };
        self.pending_lines.push(line);
        Ok(line.id)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = *self;
        for (product_id, new_stock) in this.staged_stock {
            if let Some(rec) = this.state.products.get_mut(&product_id) {
                rec.stock = new_stock;
            }
        }
        if let Some(entry) = this.pending_entry {
            this.state.entries.push(entry);
        }
        this.state.lines.append(&mut this.pending_lines);
        // Guard drops here, releasing the store
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_product(price_cents: i64, stock: i64) -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let product = store
            .create_product(NewProduct {
                name: "Widget".to_string(),
                description: String::new(),
                price_cents,
                stock,
                category_id: None,
            })
            .await
            .unwrap();
        (store, product.id)
    }

    #[tokio::test]
    async fn test_category_crud_and_soft_delete() {
        let store = MemoryStore::new();

        let cat = store
            .create_category(NewCategory {
                name: "Drinks".to_string(),
                description: "Cold drinks".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(cat.id, 1);

        let updated = store
            .update_category(
                cat.id,
                CategoryUpdate {
                    name: "Beverages".to_string(),
                    description: "All drinks".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Beverages");
        assert!(updated.updated_at >= cat.updated_at);

        store.delete_category(cat.id).await.unwrap();
        assert!(store.get_category(cat.id).await.unwrap_err().is_not_found());
        assert!(store.list_categories().await.unwrap().is_empty());

        // Deleting twice is a not-found
        assert!(store
            .delete_category(cat.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_product_list_filter_is_case_insensitive() {
        let store = MemoryStore::new();
        for name in ["Cola 330ml", "Cola 500ml", "Orange Juice"] {
            store
                .create_product(NewProduct {
                    name: name.to_string(),
                    description: String::new(),
                    price_cents: 100,
                    stock: 1,
                    category_id: None,
                })
                .await
                .unwrap();
        }

        let hits = store.list_products(Some("cola")).await.unwrap();
        assert_eq!(hits.len(), 2);

        let all = store.list_products(None).await.unwrap();
        assert_eq!(all.len(), 3);
        // Ascending id order
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_product_joins_live_category_name() {
        let store = MemoryStore::new();
        let cat = store
            .create_category(NewCategory {
                name: "Drinks".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let product = store
            .create_product(NewProduct {
                name: "Cola".to_string(),
                description: String::new(),
                price_cents: 100,
                stock: 1,
                category_id: Some(cat.id),
            })
            .await
            .unwrap();
        assert_eq!(product.category_name.as_deref(), Some("Drinks"));

        // Deleting the category drops the joined name but not the link
        store.delete_category(cat.id).await.unwrap();
        let product = store.get_product(product.id).await.unwrap();
        assert_eq!(product.category_id, Some(cat.id));
        assert_eq!(product.category_name, None);
    }

    #[tokio::test]
    async fn test_create_product_rejects_unknown_category() {
        let store = MemoryStore::new();
        let err = store
            .create_product(NewProduct {
                name: "Cola".to_string(),
                description: String::new(),
                price_cents: 100,
                stock: 1,
                category_id: Some(99),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_checkout_commit_applies_writes() {
        let (store, id) = store_with_product(100, 10).await;

        let mut tx = store.begin_checkout().await.unwrap();
        let locked = tx.lock_product(id).await.unwrap().unwrap();
        assert_eq!(locked.stock, 10);

        tx.write_stock(id, 9).await.unwrap();
        let (entry_id, _ts) = tx.insert_header(100).await.unwrap();
        tx.insert_line(entry_id, id, 1, 100).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.get_product(id).await.unwrap().stock, 9);
        let totals = store
            .ledger_totals(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(totals.revenue_cents, 100);
        assert_eq!(totals.entry_count, 1);
    }

    #[tokio::test]
    async fn test_checkout_drop_rolls_back() {
        let (store, id) = store_with_product(100, 10).await;

        {
            let mut tx = store.begin_checkout().await.unwrap();
            tx.lock_product(id).await.unwrap().unwrap();
            tx.write_stock(id, 3).await.unwrap();
            let (entry_id, _) = tx.insert_header(700).await.unwrap();
            tx.insert_line(entry_id, id, 7, 700).await.unwrap();
            // Dropped without commit
        }

        assert_eq!(store.get_product(id).await.unwrap().stock, 10);
        let totals = store
            .ledger_totals(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(totals.entry_count, 0);
    }

    #[tokio::test]
    async fn test_relock_observes_own_staged_write() {
        let (store, id) = store_with_product(100, 10).await;

        let mut tx = store.begin_checkout().await.unwrap();
        tx.lock_product(id).await.unwrap().unwrap();
        tx.write_stock(id, 6).await.unwrap();

        // A duplicate cart item re-locks the same row mid-transaction
        let relocked = tx.lock_product(id).await.unwrap().unwrap();
        assert_eq!(relocked.stock, 6);
    }

    #[tokio::test]
    async fn test_open_checkout_blocks_competitor() {
        let (store, id) = store_with_product(100, 10).await;

        let mut tx = store.begin_checkout().await.unwrap();
        tx.lock_product(id).await.unwrap().unwrap();
        tx.write_stock(id, 5).await.unwrap();

        // A competing checkout cannot even begin while this one is open
        let competitor = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut tx = store.begin_checkout().await.unwrap();
                tx.lock_product(id).await.unwrap().unwrap().stock
            })
        };

        tokio::task::yield_now().await;
        assert!(!competitor.is_finished());

        tx.commit().await.unwrap();
        // After commit the competitor observes the updated stock
        assert_eq!(competitor.await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_best_seller_window_and_sentinel() {
        let (store, cola) = store_with_product(100, 100).await;
        let juice = store
            .create_product(NewProduct {
                name: "Juice".to_string(),
                description: String::new(),
                price_cents: 200,
                stock: 100,
                category_id: None,
            })
            .await
            .unwrap()
            .id;

        for (product_id, quantity) in [(cola, 2), (juice, 5)] {
            let mut tx = store.begin_checkout().await.unwrap();
            let locked = tx.lock_product(product_id).await.unwrap().unwrap();
            tx.write_stock(product_id, locked.stock - quantity)
                .await
                .unwrap();
            let (entry_id, _) = tx
                .insert_header(locked.price_cents * quantity)
                .await
                .unwrap();
            tx.insert_line(entry_id, product_id, quantity, locked.price_cents * quantity)
                .await
                .unwrap();
            tx.commit().await.unwrap();
        }

        let best = store
            .best_seller(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(best.name, "Juice");
        assert_eq!(best.quantity, 5);

        // Empty window
        let past = store
            .best_seller(
                Utc::now() - Duration::days(2),
                Utc::now() - Duration::days(1),
            )
            .await
            .unwrap();
        assert!(past.is_none());
    }

    #[tokio::test]
    async fn test_half_open_window_boundaries() {
        let store = MemoryStore::new();
        let stamp = Utc::now();
        {
            let mut state = store.state.lock().await;
            state.next_entry_id += 1;
            let id = state.next_entry_id;
            state.entries.push(EntryRecord {
                id,
                total_cents: 100,
                created_at: stamp,
            });
        }

        // Entry exactly at start is included
        let at_start = store
            .ledger_totals(stamp, stamp + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(at_start.entry_count, 1);

        // Entry exactly at end is excluded
        let at_end = store
            .ledger_totals(stamp - Duration::hours(1), stamp)
            .await
            .unwrap();
        assert_eq!(at_end.entry_count, 0);

        // start == end is an empty window
        let empty = store.ledger_totals(stamp, stamp).await.unwrap();
        assert_eq!(empty.entry_count, 0);
    }

    #[tokio::test]
    async fn test_purge_respects_retention_and_keeps_ledger() {
        let (store, id) = store_with_product(100, 10).await;

        // Record one sale so the ledger holds a line for this product
        let mut tx = store.begin_checkout().await.unwrap();
        tx.lock_product(id).await.unwrap().unwrap();
        tx.write_stock(id, 9).await.unwrap();
        let (entry_id, _) = tx.insert_header(100).await.unwrap();
        tx.insert_line(entry_id, id, 1, 100).await.unwrap();
        tx.commit().await.unwrap();

        store.delete_product(id).await.unwrap();

        // Deleted just now: a 30-day retention keeps it
        assert_eq!(store.purge_soft_deleted(Duration::days(30)).await.unwrap(), 0);

        // Zero retention purges it
        assert_eq!(
            store.purge_soft_deleted(Duration::zero()).await.unwrap(),
            1
        );

        // The ledger survives; the purged product drops out of the join
        let totals = store
            .ledger_totals(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(totals.entry_count, 1);
        let best = store
            .best_seller(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert!(best.is_none());
    }
}
