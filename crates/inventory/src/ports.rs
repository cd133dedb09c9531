//! Store and cache boundaries the inventory services depend on.
//!
//! Services receive these as `Arc<dyn …>` in their constructors; there is no
//! process-wide handle. Tests swap in the in-memory adapters from the infra
//! crate (or their own wrappers) through the same traits.

use async_trait::async_trait;

use ims_core::{HubId, SkuId};

use crate::error::{CacheError, InventoryResult};
use crate::record::{InventoryKey, InventoryRecord};

/// Relational source of truth for inventory rows.
///
/// Implementations must:
/// - return `Ok(None)` from `find` when the row is absent (absence is not an error here)
/// - make `insert` fail with `Conflict` when the pair already exists
/// - make `overwrite` fail with `NotFound` when the pair does not exist
/// - hand out transactions whose `lock_quantity` blocks other lockers of the
///   same pair until commit/rollback, without blocking other pairs
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn find(&self, key: InventoryKey) -> InventoryResult<Option<InventoryRecord>>;

    async fn insert(&self, record: &InventoryRecord) -> InventoryResult<()>;

    /// Replace quantity and unit price of an existing row.
    async fn overwrite(&self, record: &InventoryRecord) -> InventoryResult<()>;

    async fn list_all(&self) -> InventoryResult<Vec<InventoryRecord>>;

    async fn list_by_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>>;

    async fn list_by_sku(&self, sku_id: SkuId) -> InventoryResult<Vec<InventoryRecord>>;

    /// Open a transaction used for locked quantity mutation.
    async fn begin_stock_transaction(&self) -> InventoryResult<Box<dyn StockTransaction>>;
}

/// A single open store transaction.
///
/// Dropping a transaction without `commit` discards its writes and releases
/// its locks.
#[async_trait]
pub trait StockTransaction: Send {
    /// Acquire the exclusive row lock for `key` and return the quantity it
    /// holds (`SELECT … FOR UPDATE`).
    async fn lock_quantity(&mut self, key: InventoryKey) -> InventoryResult<i64>;

    /// Stage a new quantity for a row previously locked in this transaction.
    async fn write_quantity(&mut self, key: InventoryKey, quantity: i64) -> InventoryResult<()>;

    async fn commit(self: Box<Self>) -> InventoryResult<()>;

    async fn rollback(self: Box<Self>) -> InventoryResult<()>;
}

/// Existence checks against the hub and SKU tables.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn hub_exists(&self, hub_id: HubId) -> InventoryResult<bool>;

    async fn sku_exists(&self, sku_id: SkuId) -> InventoryResult<bool>;
}

/// String key/value cache without expiry.
///
/// `get` distinguishes a miss (`Ok(None)`) from a hit (`Ok(Some(_))`) and from
/// an unreachable cache (`Err`).
#[async_trait]
pub trait ValidationCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` with no TTL.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
