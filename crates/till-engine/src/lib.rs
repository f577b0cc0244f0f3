//! # till-engine: Checkout Engine + Report Aggregator
//!
//! The core of Till: converting carts into committed ledger entries, and
//! summarizing committed entries over time windows.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Engine Layer                                │
//! │                                                                         │
//! │  apps/server handlers                                                  │
//! │       │                    │                                            │
//! │       ▼                    ▼                                            │
//! │  ┌──────────────┐   ┌──────────────────┐                               │
//! │  │CheckoutEngine│   │ ReportAggregator │   ★ THIS CRATE ★             │
//! │  │              │   │                  │                               │
//! │  │ validate     │   │ ledger_totals    │                               │
//! │  │ lock/check/  │   │ best_seller      │                               │
//! │  │ decrement    │   │ [start, end)     │                               │
//! │  │ commit       │   │                  │                               │
//! │  └──────┬───────┘   └────────┬─────────┘                               │
//! │         │    Arc<dyn Store>  │                                         │
//! │         ▼                    ▼                                         │
//! │  till-store (MemoryStore │ SqliteStore)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`checkout`] - The atomic cart-to-ledger-entry operation
//! - [`report`] - Read-only window aggregation
//! - [`error`] - The checkout error taxonomy
//!
//! Both engines receive their store in the constructor; nothing here is
//! a global.

pub mod checkout;
pub mod error;
pub mod report;

pub use checkout::CheckoutEngine;
pub use error::{CheckoutError, CheckoutResult};
pub use report::ReportAggregator;
