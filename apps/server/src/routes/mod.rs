//! Route handlers, one module per resource.

pub mod categories;
pub mod checkout;
pub mod health;
pub mod products;
pub mod reports;
