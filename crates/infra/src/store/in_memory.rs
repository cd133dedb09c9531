use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use ims_core::{HubId, SkuId};
use ims_inventory::{
    InventoryError, InventoryKey, InventoryRecord, InventoryResult, InventoryStore,
    StockTransaction,
};

/// In-memory inventory store for tests/dev.
///
/// Each (sku, hub) pair has its own async lock standing in for the Postgres
/// row lock: a transaction holds it from `lock_quantity` until commit or
/// rollback, and `overwrite` waits for it, so different pairs never block
/// each other.
#[derive(Debug, Default, Clone)]
pub struct InMemoryInventoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: RwLock<HashMap<InventoryKey, InventoryRecord>>,
    row_locks: Mutex<HashMap<InventoryKey, Arc<AsyncMutex<()>>>>,
}

impl Inner {
    fn row_lock(&self, key: InventoryKey) -> InventoryResult<Arc<AsyncMutex<()>>> {
        let mut locks = self.row_locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(key).or_default().clone())
    }

    fn read_row(&self, key: InventoryKey) -> InventoryResult<Option<InventoryRecord>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&key).copied())
    }

    fn collect<F>(&self, keep: F) -> InventoryResult<Vec<InventoryRecord>>
    where
        F: Fn(&InventoryRecord) -> bool,
    {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut out: Vec<InventoryRecord> = rows.values().filter(|r| keep(r)).copied().collect();
        out.sort_by_key(|r| (r.sku_id, r.hub_id));
        Ok(out)
    }
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn find(&self, key: InventoryKey) -> InventoryResult<Option<InventoryRecord>> {
        self.inner.read_row(key)
    }

    async fn insert(&self, record: &InventoryRecord) -> InventoryResult<()> {
        let mut rows = self.inner.rows.write().map_err(|_| poisoned())?;
        if rows.contains_key(&record.key()) {
            return Err(InventoryError::conflict(format!(
                "inventory for {} already exists",
                record.key()
            )));
        }
        rows.insert(record.key(), *record);
        Ok(())
    }

    async fn overwrite(&self, record: &InventoryRecord) -> InventoryResult<()> {
        let lock = self.inner.row_lock(record.key())?;
        let _guard = lock.lock().await;

        let mut rows = self.inner.rows.write().map_err(|_| poisoned())?;
        match rows.get_mut(&record.key()) {
            Some(row) => {
                *row = *record;
                Ok(())
            }
            None => Err(InventoryError::NotFound {
                sku_id: record.sku_id,
                hub_id: record.hub_id,
            }),
        }
    }

    async fn list_all(&self) -> InventoryResult<Vec<InventoryRecord>> {
        self.inner.collect(|_| true)
    }

    async fn list_by_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>> {
        self.inner.collect(|r| r.hub_id == hub_id)
    }

    async fn list_by_sku(&self, sku_id: SkuId) -> InventoryResult<Vec<InventoryRecord>> {
        self.inner.collect(|r| r.sku_id == sku_id)
    }

    async fn begin_stock_transaction(&self) -> InventoryResult<Box<dyn StockTransaction>> {
        Ok(Box::new(InMemoryStockTransaction {
            inner: self.inner.clone(),
            held: HashMap::new(),
            staged: HashMap::new(),
        }))
    }
}

/// Row guards plus staged writes; dropping it discards the writes and
/// releases the guards.
struct InMemoryStockTransaction {
    inner: Arc<Inner>,
    held: HashMap<InventoryKey, OwnedMutexGuard<()>>,
    staged: HashMap<InventoryKey, i64>,
}

#[async_trait]
impl StockTransaction for InMemoryStockTransaction {
    async fn lock_quantity(&mut self, key: InventoryKey) -> InventoryResult<i64> {
        if !self.held.contains_key(&key) {
            let lock = self.inner.row_lock(key)?;
            let guard = lock.lock_owned().await;
            self.held.insert(key, guard);
        }

        if let Some(quantity) = self.staged.get(&key) {
            return Ok(*quantity);
        }
        self.inner
            .read_row(key)?
            .map(|row| row.quantity)
            .ok_or(InventoryError::NotFound {
                sku_id: key.sku_id,
                hub_id: key.hub_id,
            })
    }

    async fn write_quantity(&mut self, key: InventoryKey, quantity: i64) -> InventoryResult<()> {
        if !self.held.contains_key(&key) {
            return Err(InventoryError::store(format!(
                "write to {key} without holding its row lock"
            )));
        }
        self.staged.insert(key, quantity);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> InventoryResult<()> {
        let mut rows = self.inner.rows.write().map_err(|_| poisoned())?;
        for (key, quantity) in &self.staged {
            let row = rows.get_mut(key).ok_or(InventoryError::NotFound {
                sku_id: key.sku_id,
                hub_id: key.hub_id,
            })?;
            row.quantity = *quantity;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> InventoryResult<()> {
        Ok(())
    }
}

fn poisoned() -> InventoryError {
    InventoryError::store("in-memory inventory lock poisoned")
}
