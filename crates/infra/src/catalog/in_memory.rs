use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use ims_catalog::{
    CatalogEntity, CatalogError, CatalogRepository, CatalogResult, Hub, Product, Seller, Sku,
    SkuFilter, SkuSearch, Tenant,
};
use ims_core::{Entity, HubId, SkuId};
use ims_inventory::{CatalogLookup, InventoryError, InventoryResult};

/// In-memory catalog table for tests/dev. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct InMemoryCatalogRepository<E> {
    rows: RwLock<BTreeMap<i64, E>>,
    next_id: AtomicI64,
}

impl<E> InMemoryCatalogRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl<E> Default for InMemoryCatalogRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CatalogEntity> InMemoryCatalogRepository<E> {
    pub fn contains(&self, id: E::Id) -> CatalogResult<bool> {
        let key: i64 = id.into();
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.contains_key(&key))
    }
}

#[async_trait]
impl<E: CatalogEntity> CatalogRepository<E> for InMemoryCatalogRepository<E> {
    async fn list(&self) -> CatalogResult<Vec<E>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.values().cloned().collect())
    }

    async fn get(&self, id: E::Id) -> CatalogResult<E> {
        let key: i64 = id.into();
        let rows = self.rows.read().map_err(|_| poisoned())?;
        rows.get(&key)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))
    }

    async fn create(&self, entity: E) -> CatalogResult<E> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = entity.with_id(E::Id::from(id));
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, entity: E) -> CatalogResult<E> {
        let id = entity.id();
        let key: i64 = id.into();
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let slot = rows
            .get_mut(&key)
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: E::Id) -> CatalogResult<E> {
        let key: i64 = id.into();
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.remove(&key)
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))
    }
}

#[async_trait]
impl SkuSearch for InMemoryCatalogRepository<Sku> {
    async fn search_skus(&self, filter: SkuFilter) -> CatalogResult<Vec<Sku>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.values().filter(|sku| filter.matches(sku)).cloned().collect())
    }
}

/// All five in-memory catalog tables, shared by the services and the pair
/// validator's existence checks.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    pub tenants: Arc<InMemoryCatalogRepository<Tenant>>,
    pub hubs: Arc<InMemoryCatalogRepository<Hub>>,
    pub sellers: Arc<InMemoryCatalogRepository<Seller>>,
    pub products: Arc<InMemoryCatalogRepository<Product>>,
    pub skus: Arc<InMemoryCatalogRepository<Sku>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn hub_exists(&self, hub_id: HubId) -> InventoryResult<bool> {
        self.hubs.contains(hub_id).map_err(lookup_error)
    }

    async fn sku_exists(&self, sku_id: SkuId) -> InventoryResult<bool> {
        self.skus.contains(sku_id).map_err(lookup_error)
    }
}

fn poisoned() -> CatalogError {
    CatalogError::store("in-memory catalog lock poisoned")
}

fn lookup_error(err: CatalogError) -> InventoryError {
    InventoryError::store(err.to_string())
}
