//! Instrumented port fakes for unit tests in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use ims_core::{HubId, SkuId};

use crate::error::{CacheError, InventoryError, InventoryResult};
use crate::ports::{CatalogLookup, InventoryStore, StockTransaction, ValidationCache};
use crate::record::{InventoryKey, InventoryRecord};

#[derive(Default)]
struct StoreInner {
    rows: Mutex<HashMap<InventoryKey, InventoryRecord>>,
    lock: Arc<tokio::sync::Mutex<()>>,
    find_calls: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_writes: AtomicBool,
    hide_from_find: AtomicBool,
}

/// Store fake with a single table-wide lock and call counters.
#[derive(Default, Clone)]
pub struct FakeStore {
    inner: Arc<StoreInner>,
}

impl FakeStore {
    pub fn with_rows(rows: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.inner.rows.lock().unwrap();
            for r in rows {
                map.insert(r.key(), r);
            }
        }
        store
    }

    pub fn quantity(&self, key: InventoryKey) -> Option<i64> {
        self.inner.rows.lock().unwrap().get(&key).map(|r| r.quantity)
    }

    pub fn find_calls(&self) -> usize {
        self.inner.find_calls.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.rollbacks.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `find` report every pair as absent, as a racing writer would see.
    pub fn hide_rows_from_find(&self, hide: bool) {
        self.inner.hide_from_find.store(hide, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryStore for FakeStore {
    async fn find(&self, key: InventoryKey) -> InventoryResult<Option<InventoryRecord>> {
        self.inner.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.hide_from_find.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.inner.rows.lock().unwrap().get(&key).copied())
    }

    async fn insert(&self, record: &InventoryRecord) -> InventoryResult<()> {
        let mut rows = self.inner.rows.lock().unwrap();
        if rows.contains_key(&record.key()) {
            return Err(InventoryError::conflict("duplicate"));
        }
        rows.insert(record.key(), *record);
        Ok(())
    }

    async fn overwrite(&self, record: &InventoryRecord) -> InventoryResult<()> {
        let mut rows = self.inner.rows.lock().unwrap();
        match rows.get_mut(&record.key()) {
            Some(row) => {
                row.quantity = record.quantity;
                row.unit_price = record.unit_price;
                Ok(())
            }
            None => Err(InventoryError::NotFound {
                sku_id: record.sku_id,
                hub_id: record.hub_id,
            }),
        }
    }

    async fn list_all(&self) -> InventoryResult<Vec<InventoryRecord>> {
        Ok(self.inner.rows.lock().unwrap().values().copied().collect())
    }

    async fn list_by_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>> {
        Ok(self
            .inner
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.hub_id == hub_id)
            .copied()
            .collect())
    }

    async fn list_by_sku(&self, sku_id: SkuId) -> InventoryResult<Vec<InventoryRecord>> {
        Ok(self
            .inner
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.sku_id == sku_id)
            .copied()
            .collect())
    }

    async fn begin_stock_transaction(&self) -> InventoryResult<Box<dyn StockTransaction>> {
        Ok(Box::new(FakeTx {
            inner: self.inner.clone(),
            guard: None,
            staged: Vec::new(),
        }))
    }
}

struct FakeTx {
    inner: Arc<StoreInner>,
    guard: Option<OwnedMutexGuard<()>>,
    staged: Vec<(InventoryKey, i64)>,
}

#[async_trait]
impl StockTransaction for FakeTx {
    async fn lock_quantity(&mut self, key: InventoryKey) -> InventoryResult<i64> {
        if self.guard.is_none() {
            self.guard = Some(self.inner.lock.clone().lock_owned().await);
        }
        self.inner
            .rows
            .lock()
            .unwrap()
            .get(&key)
            .map(|r| r.quantity)
            .ok_or(InventoryError::NotFound {
                sku_id: key.sku_id,
                hub_id: key.hub_id,
            })
    }

    async fn write_quantity(&mut self, key: InventoryKey, quantity: i64) -> InventoryResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(InventoryError::store("injected write failure"));
        }
        self.staged.push((key, quantity));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> InventoryResult<()> {
        let mut rows = self.inner.rows.lock().unwrap();
        for (key, quantity) in &self.staged {
            if let Some(row) = rows.get_mut(key) {
                row.quantity = *quantity;
            }
        }
        self.inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> InventoryResult<()> {
        self.inner.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hub/SKU existence fake.
#[derive(Default)]
pub struct FakeCatalog {
    hubs: Mutex<HashSet<HubId>>,
    skus: Mutex<HashSet<SkuId>>,
}

impl FakeCatalog {
    pub fn with(hubs: &[i64], skus: &[i64]) -> Self {
        let catalog = Self::default();
        catalog
            .hubs
            .lock()
            .unwrap()
            .extend(hubs.iter().copied().map(HubId::new));
        catalog
            .skus
            .lock()
            .unwrap()
            .extend(skus.iter().copied().map(SkuId::new));
        catalog
    }

    pub fn remove_hub(&self, hub_id: HubId) {
        self.hubs.lock().unwrap().remove(&hub_id);
    }

    pub fn remove_sku(&self, sku_id: SkuId) {
        self.skus.lock().unwrap().remove(&sku_id);
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn hub_exists(&self, hub_id: HubId) -> InventoryResult<bool> {
        Ok(self.hubs.lock().unwrap().contains(&hub_id))
    }

    async fn sku_exists(&self, sku_id: SkuId) -> InventoryResult<bool> {
        Ok(self.skus.lock().unwrap().contains(&sku_id))
    }
}

/// Cache fake with switchable failures.
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeCache {
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ValidationCache for FakeCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected".to_string()));
        }
        Ok(self.entry(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected".to_string()));
        }
        self.put(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected".to_string()));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
