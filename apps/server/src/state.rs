//! Shared application state.
//!
//! Constructed once at startup (store → engines → state) and injected
//! into handlers via axum's `State` extractor. Explicit dependency
//! injection all the way down; nothing here is a global.

use std::sync::Arc;

use till_engine::{CheckoutEngine, ReportAggregator};
use till_store::Store;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The selected storage backend, for catalog CRUD and health checks.
    pub store: Arc<dyn Store>,
    /// Checkout engine over the same store.
    pub checkout: CheckoutEngine,
    /// Report aggregator over the same store.
    pub reports: ReportAggregator,
}

impl AppState {
    /// Builds the state for a store: both engines share it.
    pub fn new(store: Arc<dyn Store>) -> Self {
        AppState {
            checkout: CheckoutEngine::new(store.clone()),
            reports: ReportAggregator::new(store.clone()),
            store,
        }
    }
}
