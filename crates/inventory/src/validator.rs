//! Hub/SKU pair eligibility with a positive-result cache.
//!
//! The cache only ever holds `valid`. A cached negative could go stale the
//! moment a row is created, whereas re-deriving "invalid" from the store is
//! cheap. The remaining risk, a stale positive, is handled by re-checking hub
//! and SKU existence on every hit and evicting the key when either is gone.

use std::sync::Arc;

use tracing::{debug, info, warn};

use ims_core::{HubId, SkuId};

use crate::cache_key::{ValidationCacheKey, VALID_MARKER};
use crate::error::InventoryResult;
use crate::ports::{CatalogLookup, InventoryStore, ValidationCache};
use crate::record::InventoryKey;

#[derive(Clone)]
pub struct PairValidator {
    inventory: Arc<dyn InventoryStore>,
    catalog: Arc<dyn CatalogLookup>,
    cache: Arc<dyn ValidationCache>,
}

impl PairValidator {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        catalog: Arc<dyn CatalogLookup>,
        cache: Arc<dyn ValidationCache>,
    ) -> Self {
        Self {
            inventory,
            catalog,
            cache,
        }
    }

    /// Is `(hub_id, sku_id)` eligible for order placement?
    ///
    /// `Ok(false)` is a determinate answer. `Err` means the store could not be
    /// consulted; cache failures never produce an error.
    pub async fn validate(&self, hub_id: HubId, sku_id: SkuId) -> InventoryResult<bool> {
        let key = ValidationCacheKey::new(hub_id, sku_id);

        match self.cache.get(key.as_str()).await {
            Ok(Some(value)) if value == VALID_MARKER => {
                debug!(%key, "validation cache hit");
                return self.confirm_cached(&key, hub_id, sku_id).await;
            }
            Ok(Some(value)) => {
                warn!(%key, %value, "unexpected validation cache value; ignoring");
            }
            Ok(None) => {
                debug!(%key, "validation cache miss");
            }
            Err(e) => {
                warn!(%key, error = %e, "validation cache unavailable; using store");
            }
        }

        let found = self
            .inventory
            .find(InventoryKey::new(sku_id, hub_id))
            .await?
            .is_some();

        if !found {
            debug!(%key, "no inventory for pair");
            return Ok(false);
        }

        match self.cache.set(key.as_str(), VALID_MARKER).await {
            Ok(()) => info!(%key, "stored pair validation in cache"),
            Err(e) => warn!(%key, error = %e, "failed to store pair validation in cache"),
        }
        Ok(true)
    }

    /// Fast path: trust the cached positive only while both rows still exist.
    async fn confirm_cached(
        &self,
        key: &ValidationCacheKey,
        hub_id: HubId,
        sku_id: SkuId,
    ) -> InventoryResult<bool> {
        if !self.catalog.hub_exists(hub_id).await? {
            warn!(%key, %hub_id, "hub no longer exists; evicting cached validation");
            self.evict(key).await;
            return Ok(false);
        }

        if !self.catalog.sku_exists(sku_id).await? {
            warn!(%key, %sku_id, "sku no longer exists; evicting cached validation");
            self.evict(key).await;
            return Ok(false);
        }

        info!(%key, "pair validated from cache");
        Ok(true)
    }

    async fn evict(&self, key: &ValidationCacheKey) {
        if let Err(e) = self.cache.delete(key.as_str()).await {
            warn!(%key, error = %e, "failed to evict stale validation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::InventoryRecord;
    use crate::testing::{FakeCache, FakeCatalog, FakeStore};

    struct Fixture {
        store: Arc<FakeStore>,
        catalog: Arc<FakeCatalog>,
        cache: Arc<FakeCache>,
        validator: PairValidator,
    }

    fn fixture(rows: Vec<InventoryRecord>, hubs: &[i64], skus: &[i64]) -> Fixture {
        let store = Arc::new(FakeStore::with_rows(rows));
        let catalog = Arc::new(FakeCatalog::with(hubs, skus));
        let cache = Arc::new(FakeCache::default());
        let validator = PairValidator::new(store.clone(), catalog.clone(), cache.clone());
        Fixture {
            store,
            catalog,
            cache,
            validator,
        }
    }

    fn row(sku: i64, hub: i64) -> InventoryRecord {
        InventoryRecord::new(SkuId::new(sku), HubId::new(hub), 10, 100)
    }

    #[tokio::test]
    async fn first_call_populates_cache_and_second_skips_inventory() {
        let f = fixture(vec![row(1, 2)], &[2], &[1]);

        assert!(f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.cache.entry("hub:2:sku:1").as_deref(), Some(VALID_MARKER));
        assert_eq!(f.store.find_calls(), 1);

        assert!(f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.store.find_calls(), 1);
    }

    #[tokio::test]
    async fn missing_pair_is_invalid_and_never_cached() {
        let f = fixture(vec![], &[9], &[9]);

        assert!(!f.validator.validate(HubId::new(9), SkuId::new(9)).await.unwrap());
        assert_eq!(f.cache.entry("hub:9:sku:9"), None);
    }

    #[tokio::test]
    async fn deleted_hub_evicts_stale_positive() {
        let f = fixture(vec![row(1, 2)], &[2], &[1]);
        assert!(f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());

        f.catalog.remove_hub(HubId::new(2));

        assert!(!f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.cache.entry("hub:2:sku:1"), None);
    }

    #[tokio::test]
    async fn deleted_sku_evicts_stale_positive() {
        let f = fixture(vec![row(1, 2)], &[2], &[1]);
        f.cache.put("hub:2:sku:1", VALID_MARKER);
        f.catalog.remove_sku(SkuId::new(1));

        assert!(!f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.cache.entry("hub:2:sku:1"), None);
    }

    #[tokio::test]
    async fn unreadable_cache_falls_back_to_store() {
        let f = fixture(vec![row(1, 2)], &[2], &[1]);
        f.cache.fail_reads(true);

        assert!(f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert!(f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.store.find_calls(), 2);
    }

    #[tokio::test]
    async fn failed_cache_write_still_reports_valid() {
        let f = fixture(vec![row(1, 2)], &[2], &[1]);
        f.cache.fail_writes(true);

        assert!(f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.cache.entry("hub:2:sku:1"), None);
    }

    #[tokio::test]
    async fn foreign_cache_value_is_treated_as_miss() {
        let f = fixture(vec![], &[2], &[1]);
        f.cache.put("hub:2:sku:1", "maybe");

        assert!(!f.validator.validate(HubId::new(2), SkuId::new(1)).await.unwrap());
        assert_eq!(f.store.find_calls(), 1);
    }
}
