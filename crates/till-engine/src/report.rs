//! # Report Aggregator
//!
//! Read-only summaries of committed ledger data over time windows.
//!
//! ## Window Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Half-Open Windows: [start, end)                            │
//! │                                                                         │
//! │  start                                 end                              │
//! │    │◄──────────── included ────────────►│                               │
//! │    ●────────────────────────────────────○                               │
//! │    │                                    │                               │
//! │  entry AT start: included            entry AT end: excluded            │
//! │                                                                         │
//! │  daily_report(day) = report(day 00:00, next day 00:00)                 │
//! │  → adjacent days never double-count an entry                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregator only reads. It takes no write holds and never blocks
//! checkout progress; calling it twice over the same window with no
//! intervening checkouts returns identical summaries. An empty window is
//! a valid result (zeros and the `("-", 0)` best-seller sentinel), not
//! an error.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use till_core::{BestSeller, ReportSummary};
use till_store::{Store, StoreResult};

/// The report aggregator.
///
/// Cheap to clone; receives its store at construction.
#[derive(Clone)]
pub struct ReportAggregator {
    store: Arc<dyn Store>,
}

impl ReportAggregator {
    /// Creates a report aggregator over a store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        ReportAggregator { store }
    }

    /// Summarizes committed ledger entries in the half-open window
    /// `[start, end)`.
    ///
    /// Callers are responsible for handing in already-validated
    /// timestamps with `start <= end`; the only failure mode left here
    /// is a store error.
    pub async fn report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<ReportSummary> {
        let totals = self.store.ledger_totals(start, end).await?;
        let best_seller = self
            .store
            .best_seller(start, end)
            .await?
            .unwrap_or_else(BestSeller::none);

        debug!(
            %start,
            %end,
            revenue_cents = totals.revenue_cents,
            transaction_count = totals.entry_count,
            "report window computed"
        );

        Ok(ReportSummary {
            revenue_cents: totals.revenue_cents,
            transaction_count: totals.entry_count,
            best_seller,
        })
    }

    /// Daily convenience form: the whole UTC day `[00:00, +24h)`.
    pub async fn daily_report(&self, day: NaiveDate) -> StoreResult<ReportSummary> {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::hours(24);
        self.report(start, end).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
