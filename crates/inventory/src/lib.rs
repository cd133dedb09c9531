//! Inventory consistency core.
//!
//! This crate owns the stock ledger keyed by (SKU, hub), the cache-accelerated
//! hub/SKU pair validator, and the check-and-reserve entry point used during
//! order validation. It performs no IO itself: every store and cache access
//! goes through the ports in [`ports`], which the infra crate implements for
//! Postgres, Redis and in-memory backends.

pub mod cache_key;
pub mod error;
pub mod ledger;
pub mod ports;
pub mod record;
pub mod status;
pub mod validator;

#[cfg(test)]
mod testing;

pub use cache_key::{ValidationCacheKey, VALID_MARKER};
pub use error::{CacheError, InventoryError, InventoryResult};
pub use ledger::{InventoryLedger, UpsertOutcome};
pub use ports::{CatalogLookup, InventoryStore, StockTransaction, ValidationCache};
pub use record::{InventoryKey, InventoryRecord};
pub use status::{StatusChecker, StockStatus};
pub use validator::PairValidator;
