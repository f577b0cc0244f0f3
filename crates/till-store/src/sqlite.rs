//! # SQLite Store
//!
//! The persistent backend: a `SqlitePool` plus embedded migrations.
//!
//! ## Exclusivity Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  SqliteStore Checkout Exclusivity                       │
//! │                                                                         │
//! │  begin_checkout()                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pool.begin() ──► sqlx Transaction                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock_product(id):                                                      │
//! │    1. UPDATE products SET stock = stock WHERE id = ? ...                │
//! │       └── a self-assignment that forces this transaction to take       │
//! │           SQLite's write lock BEFORE the stock value is read.          │
//! │           A competing checkout's own UPDATE now blocks (busy           │
//! │           timeout) until we commit or roll back.                       │
//! │    2. SELECT name, price_cents, stock ... — read under the lock        │
//! │                                                                         │
//! │  Without step 1, two checkouts could both read stock=9 inside         │
//! │  their snapshots and both decide a 5-unit sale fits: the classic      │
//! │  lost update. With it, the loser re-reads AFTER the winner commits    │
//! │  and observes stock=4.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite allows one writer per database, so the hold is effectively
//! store-wide: multi-item carts cannot deadlock whatever their item
//! order. WAL mode keeps the report queries reading while a checkout
//! writes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::Sqlite;
use sqlx::{SqlitePool, Transaction};
use tracing::{debug, info};

use till_core::{BestSeller, Category, Product};

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::pool::{create_pool, DbConfig};
use crate::store::{
    CategoryUpdate, CheckoutTx, LedgerTotals, LockedProduct, NewCategory, NewProduct,
    ProductUpdate, Store,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price_cents: i64,
    stock: i64,
    category_id: Option<i64>,
    category_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            stock: row.stock,
            category_id: row.category_id,
            category_name: row.category_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Product SELECT with the live-category name join, shared by every
/// product read path.
const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.name, p.description, p.price_cents, p.stock, p.category_id, \
           c.name AS category_name, p.created_at, p.updated_at \
    FROM products p \
    LEFT JOIN categories c ON c.id = p.category_id AND c.deleted_at IS NULL \
    WHERE p.deleted_at IS NULL";

// =============================================================================
// SqliteStore
// =============================================================================

/// SQLite-backed [`Store`] implementation.
///
/// ## Usage
/// ```rust,ignore
/// let store = SqliteStore::connect(DbConfig::new("./till.db")).await?;
/// let categories = store.list_categories().await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to the database and applies pending migrations.
    pub async fn connect(config: DbConfig) -> StoreResult<Self> {
        let pool = create_pool(&config).await?;

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        info!("SQLite store ready");
        Ok(SqliteStore { pool })
    }

    /// Returns a reference to the connection pool.
    ///
    /// For maintenance queries not covered by the trait. Prefer the
    /// trait methods.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the connection pool. Call on shutdown.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    async fn fetch_product(&self, id: i64) -> StoreResult<Product> {
        let sql = format!("{PRODUCT_SELECT} AND p.id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::from)
            .ok_or_else(|| StoreError::not_found("product", id))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn begin_checkout(&self) -> StoreResult<Box<dyn CheckoutTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteCheckout { tx }))
    }

    async fn ledger_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<LedgerTotals> {
        let (revenue_cents, entry_count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_cents), 0), COUNT(id) \
             FROM ledger_entries \
             WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerTotals {
            revenue_cents,
            entry_count,
        })
    }

    async fn best_seller(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Option<BestSeller>> {
        // Lines whose product was purged drop out of the join; ties
        // break by ascending name, matching the in-memory backend.
        let row: Option<(String, i64)> = sqlx::query_as(
            "SELECT p.name, SUM(l.quantity) AS quantity \
             FROM ledger_lines l \
             JOIN ledger_entries e ON e.id = l.entry_id \
             JOIN products p ON p.id = l.product_id \
             WHERE e.created_at >= ?1 AND e.created_at < ?2 \
             GROUP BY p.name \
             ORDER BY quantity DESC, p.name ASC \
             LIMIT 1",
        )
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name, quantity)| BestSeller { name, quantity }))
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at \
             FROM categories WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: i64) -> StoreResult<Category> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at \
             FROM categories WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Category::from)
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_category(&self, id: i64, update: CategoryUpdate) -> StoreResult<Category> {
        let result = sqlx::query(
            "UPDATE categories SET name = ?1, description = ?2, updated_at = ?3 \
             WHERE id = ?4 AND deleted_at IS NULL",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }
        self.get_category(id).await
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }
        Ok(())
    }

    async fn list_products(&self, name_filter: Option<&str>) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "{PRODUCT_SELECT} \
             AND (?1 IS NULL OR INSTR(LOWER(p.name), LOWER(?1)) > 0) \
             ORDER BY p.id"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(name_filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: i64) -> StoreResult<Product> {
        self.fetch_product(id).await
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products \
             (name, description, price_cents, stock, category_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(new.stock)
        .bind(new.category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        // Re-read for the joined category name
        self.fetch_product(result.last_insert_rowid()).await
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> StoreResult<Product> {
        let result = sqlx::query(
            "UPDATE products SET name = ?1, description = ?2, price_cents = ?3, \
             stock = ?4, category_id = ?5, updated_at = ?6 \
             WHERE id = ?7 AND deleted_at IS NULL",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price_cents)
        .bind(update.stock)
        .bind(update.category_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        self.fetch_product(id).await
    }

    async fn delete_product(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        Ok(())
    }

    async fn purge_soft_deleted(&self, older_than: Duration) -> StoreResult<u64> {
        let cutoff = Utc::now() - older_than;

        // Products first; the category FK is ON DELETE SET NULL so the
        // order only matters for the ledger never being touched.
        let products = sqlx::query("DELETE FROM products WHERE deleted_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let categories = sqlx::query("DELETE FROM categories WHERE deleted_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let removed = products.rows_affected() + categories.rows_affected();
        debug!(removed, "purged soft-deleted rows");
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// SqliteCheckout
// =============================================================================

/// One checkout's unit of work against [`SqliteStore`].
///
/// Wraps a sqlx transaction; sqlx rolls back on drop, so an abandoned
/// checkout leaves no trace.
struct SqliteCheckout {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl CheckoutTx for SqliteCheckout {
    async fn lock_product(&mut self, product_id: i64) -> StoreResult<Option<LockedProduct>> {
        // Step 1: force this row into our write set BEFORE reading it.
        // The self-assignment changes nothing but promotes the
        // transaction to writer, so a competing checkout blocks here
        // until we commit or roll back.
        let touched = sqlx::query(
            "UPDATE products SET stock = stock WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .execute(&mut *self.tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        // Step 2: read under the lock
        let row: Option<(String, i64, i64)> = sqlx::query_as(
            "SELECT name, price_cents, stock FROM products \
             WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(name, price_cents, stock)| LockedProduct {
            name,
            price_cents,
            stock,
        }))
    }

    async fn write_stock(&mut self, product_id: i64, new_stock: i64) -> StoreResult<()> {
        sqlx::query("UPDATE products SET stock = ?1 WHERE id = ?2")
            .bind(new_stock)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_header(&mut self, total_cents: i64) -> StoreResult<(i64, DateTime<Utc>)> {
        // The timestamp is bound into the INSERT and returned as-is, so
        // the committed row and the caller's LedgerEntry cannot diverge.
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO ledger_entries (total_cents, created_at) VALUES (?1, ?2)",
        )
        .bind(total_cents)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok((result.last_insert_rowid(), created_at))
    }

    async fn insert_line(
        &mut self,
        header_id: i64,
        product_id: i64,
        quantity: i64,
        subtotal_cents: i64,
    ) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO ledger_lines (entry_id, product_id, quantity, subtotal_cents) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(header_id)
        .bind(product_id)
        .bind(quantity)
        .bind(subtotal_cents)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
