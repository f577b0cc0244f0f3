//! # Store Trait
//!
//! The one storage interface both backends implement.
//!
//! ## Storage Polymorphism
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Store Selection at Startup                          │
//! │                                                                         │
//! │  ServerConfig { store: Backend }                                       │
//! │       │                                                                 │
//! │       ├── Backend::Memory ──► MemoryStore (BTreeMaps behind a mutex)   │
//! │       │                                                                 │
//! │       └── Backend::Sqlite ──► SqliteStore (pool + migrations)          │
//! │                                                                         │
//! │  Either way the rest of the system sees Arc<dyn Store> and is          │
//! │  constructed with it explicitly. No globals, no downcasting.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Checkout Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  store.begin_checkout()                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Box<dyn CheckoutTx> ── lock_product(id) ─► (name, price, stock)       │
//! │       │                 write_stock(id, new)                            │
//! │       │                 insert_header(total) ─► (id, created_at)        │
//! │       │                 insert_line(...)                                │
//! │       │                                                                 │
//! │       ├── commit()  → everything becomes visible atomically            │
//! │       └── drop      → rollback, no trace remains                       │
//! │                                                                         │
//! │  lock_product acquires an EXCLUSIVE hold: a competing checkout         │
//! │  touching the same product blocks until this unit of work ends,        │
//! │  then observes the updated stock.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both shipped backends serialize checkout writers store-wide (the
//! in-memory state mutex, SQLite's single writer), so multi-item carts
//! cannot deadlock whatever their item order. A backend with genuine
//! per-row locks would have to acquire holds in ascending product id
//! order instead.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use till_core::{BestSeller, Category, Money, Product};

use crate::error::StoreResult;

// =============================================================================
// Input / Row Types
// =============================================================================

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

/// Full-replace update for a category.
#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    pub name: String,
    pub description: String,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category_id: Option<i64>,
}

/// Full-replace update for a product. Setting `stock` here is the
/// restock path; checkout is the only other writer of stock.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category_id: Option<i64>,
}

/// What `lock_product` returns: the fields checkout needs, read under
/// the exclusive hold.
#[derive(Debug, Clone)]
pub struct LockedProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl LockedProduct {
    /// Returns the unit price as [`Money`].
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Header aggregates over a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTotals {
    /// `COALESCE(SUM(total_cents), 0)` over headers in the window.
    pub revenue_cents: i64,
    /// `COUNT` of headers in the window.
    pub entry_count: i64,
}

// =============================================================================
// Store Trait
// =============================================================================

/// The storage interface. One trait, two first-class implementations
/// ([`MemoryStore`](crate::MemoryStore) and
/// [`SqliteStore`](crate::SqliteStore)), selected once at process startup.
///
/// ## Conventions
/// - `get_*`/`update_*`/`delete_*` return `StoreError::NotFound` for a
///   missing or soft-deleted id.
/// - `lock_product` inside a checkout returns `Ok(None)` for a missing
///   product instead, because the business meaning of that miss
///   (`NotFound(product_id)`) belongs to the checkout engine.
/// - Reads never see soft-deleted rows; the ledger has no soft delete.
#[async_trait]
pub trait Store: Send + Sync {
    // -------------------------------------------------------------------------
    // Checkout unit of work
    // -------------------------------------------------------------------------

    /// Opens an atomic unit of work for one checkout.
    ///
    /// The returned transaction holds whatever exclusivity the backend
    /// provides (see module docs). Dropping it without `commit` rolls
    /// everything back.
    async fn begin_checkout(&self) -> StoreResult<Box<dyn CheckoutTx>>;

    // -------------------------------------------------------------------------
    // Ledger aggregation (read-only)
    // -------------------------------------------------------------------------

    /// Revenue and entry count over the half-open window `[start, end)`.
    ///
    /// An empty window yields `{ revenue_cents: 0, entry_count: 0 }`.
    async fn ledger_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<LedgerTotals>;

    /// The product with the greatest summed line quantity across entries
    /// in `[start, end)`, ties broken by ascending product name.
    ///
    /// `Ok(None)` when the window contains no lines (the caller applies
    /// the `("-", 0)` sentinel).
    async fn best_seller(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Option<BestSeller>>;

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Lists categories in ascending id order.
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn get_category(&self, id: i64) -> StoreResult<Category>;

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category>;

    /// Full replace; bumps `updated_at`. Returns the fresh row.
    async fn update_category(&self, id: i64, update: CategoryUpdate) -> StoreResult<Category>;

    /// Soft delete: the category vanishes from reads but keeps its row
    /// until the purge task removes it.
    async fn delete_category(&self, id: i64) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Lists products in ascending id order, optionally filtered by a
    /// case-insensitive substring match on the name.
    async fn list_products(&self, name_filter: Option<&str>) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: i64) -> StoreResult<Product>;

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product>;

    /// Full replace including stock (the restock path); bumps
    /// `updated_at`. Returns the fresh row.
    async fn update_product(&self, id: i64, update: ProductUpdate) -> StoreResult<Product>;

    /// Soft delete. A soft-deleted product is invisible to checkout.
    async fn delete_product(&self, id: i64) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Hard-deletes category and product rows soft-deleted longer than
    /// `older_than` ago. Returns the number of rows removed. Never
    /// touches the ledger tables.
    async fn purge_soft_deleted(&self, older_than: Duration) -> StoreResult<u64>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> StoreResult<()>;
}

// =============================================================================
// Checkout Transaction Trait
// =============================================================================

/// One checkout's atomic unit of work.
///
/// Obtained from [`Store::begin_checkout`]. The operations compose the
/// read-check-decrement-append sequence; `commit` consumes the
/// transaction, and dropping it un-committed rolls back.
#[async_trait]
pub trait CheckoutTx: Send {
    /// Reads `(name, price, stock)` for a product, acquiring the
    /// exclusive hold on its row for the rest of the unit of work.
    ///
    /// Returns `Ok(None)` when no live product has this id. Re-locking a
    /// product already held by this same transaction is legal and
    /// observes this transaction's own pending stock write.
    async fn lock_product(&mut self, product_id: i64) -> StoreResult<Option<LockedProduct>>;

    /// Writes a new stock level for a product held by this transaction.
    async fn write_stock(&mut self, product_id: i64, new_stock: i64) -> StoreResult<()>;

    /// Inserts the ledger header. The store assigns and returns both the
    /// header id and the creation timestamp; the timestamp in the
    /// committed row and the one returned here are the same value.
    async fn insert_header(&mut self, total_cents: i64) -> StoreResult<(i64, DateTime<Utc>)>;

    /// Inserts one ledger line under a header, returning the line id.
    async fn insert_line(
        &mut self,
        header_id: i64,
        product_id: i64,
        quantity: i64,
        subtotal_cents: i64,
    ) -> StoreResult<i64>;

    /// Commits the unit of work, making every write visible atomically.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
