//! # till-store: Storage Layer for Till
//!
//! One `Store` trait, two first-class backends, selected at startup.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Storage Layer                               │
//! │                                                                         │
//! │  till-engine (CheckoutEngine, ReportAggregator)                        │
//! │       │                                                                 │
//! │       ▼  Arc<dyn Store>                                                │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   till-store (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │  Store trait  │   │  MemoryStore  │   │ SqliteStore  │    │   │
//! │  │   │  CheckoutTx   │◄──│  (BTreeMaps   │   │ (pool + WAL  │    │   │
//! │  │   │  (store.rs)   │   │   + mutex)    │   │  + migrate)  │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL mode) — or nothing at all for MemoryStore            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `Store` and `CheckoutTx` traits plus input/row types
//! - [`memory`] - In-memory backend (tests, demos, ephemeral deployments)
//! - [`sqlite`] - SQLite backend (production)
//! - [`pool`] - Connection pool configuration for the SQLite backend
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use till_store::{DbConfig, MemoryStore, SqliteStore, Store};
//!
//! // Pick a backend once at startup; everyone else sees Arc<dyn Store>.
//! let store: Arc<dyn Store> = match config.backend {
//!     Backend::Sqlite => Arc::new(SqliteStore::connect(DbConfig::new(path)).await?),
//!     Backend::Memory => Arc::new(MemoryStore::new()),
//! };
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pool::DbConfig;
pub use sqlite::SqliteStore;
pub use store::{
    CategoryUpdate, CheckoutTx, LedgerTotals, LockedProduct, NewCategory, NewProduct,
    ProductUpdate, Store,
};
