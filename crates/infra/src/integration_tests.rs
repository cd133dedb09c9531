//! Integration tests for the inventory pipeline over the in-memory adapters.
//!
//! Tests: Catalog → Ledger → PairValidator / StatusChecker → Cache
//!
//! Verifies:
//! - Concurrent reservations of one pair never oversell
//! - Concurrent first upserts of one pair both succeed with a single row
//! - Stale cached validations are evicted when a hub or SKU disappears
//! - Negative validations are never cached
//! - Cache outages degrade to store lookups

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use ims_catalog::{CatalogRepository, Hub, Sku};
    use ims_core::{HubId, ProductId, SellerId, SkuId, TenantId};
    use ims_inventory::{
        CacheError, InventoryKey, InventoryLedger, InventoryRecord, InventoryResult,
        InventoryStore, PairValidator, StatusChecker, StockStatus, StockTransaction,
        UpsertOutcome, ValidationCache, ValidationCacheKey,
    };

    use crate::cache::InMemoryValidationCache;
    use crate::catalog::InMemoryCatalog;
    use crate::store::InMemoryInventoryStore;

    /// Cache wrapper whose reads and writes can be switched to fail.
    #[derive(Default)]
    struct FlakyCache {
        inner: InMemoryValidationCache,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl ValidationCache for FlakyCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("connection refused".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("connection refused".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.inner.delete(key).await
        }
    }

    /// Store wrapper that stalls after every `find`, widening the window
    /// between an upsert's existence check and its insert.
    #[derive(Default)]
    struct SlowFindStore {
        inner: InMemoryInventoryStore,
    }

    #[async_trait]
    impl InventoryStore for SlowFindStore {
        async fn find(&self, key: InventoryKey) -> InventoryResult<Option<InventoryRecord>> {
            let found = self.inner.find(key).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            found
        }

        async fn insert(&self, record: &InventoryRecord) -> InventoryResult<()> {
            self.inner.insert(record).await
        }

        async fn overwrite(&self, record: &InventoryRecord) -> InventoryResult<()> {
            self.inner.overwrite(record).await
        }

        async fn list_all(&self) -> InventoryResult<Vec<InventoryRecord>> {
            self.inner.list_all().await
        }

        async fn list_by_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>> {
            self.inner.list_by_hub(hub_id).await
        }

        async fn list_by_sku(&self, sku_id: SkuId) -> InventoryResult<Vec<InventoryRecord>> {
            self.inner.list_by_sku(sku_id).await
        }

        async fn begin_stock_transaction(&self) -> InventoryResult<Box<dyn StockTransaction>> {
            self.inner.begin_stock_transaction().await
        }
    }

    struct Harness {
        store: Arc<InMemoryInventoryStore>,
        catalog: Arc<InMemoryCatalog>,
        cache: Arc<FlakyCache>,
        ledger: Arc<InventoryLedger>,
        validator: PairValidator,
        checker: StatusChecker,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryInventoryStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let cache = Arc::new(FlakyCache::default());
        let ledger = Arc::new(InventoryLedger::new(store.clone()));
        let validator = PairValidator::new(store.clone(), catalog.clone(), cache.clone());
        let checker = StatusChecker::new(ledger.clone());
        Harness {
            store,
            catalog,
            cache,
            ledger,
            validator,
            checker,
        }
    }

    fn record(sku: SkuId, hub: HubId, quantity: i64) -> InventoryRecord {
        InventoryRecord::new(sku, hub, quantity, 100)
    }

    async fn seed_pair(h: &Harness, quantity: i64) -> (HubId, SkuId) {
        let hub = h
            .catalog
            .hubs
            .create(Hub {
                id: HubId::default(),
                tenant_id: TenantId::new(1),
                manager_name: "Asha".to_string(),
                manager_contact: String::new(),
                manager_email: String::new(),
            })
            .await
            .unwrap();
        let sku = h
            .catalog
            .skus
            .create(Sku {
                id: SkuId::default(),
                seller_id: SellerId::new(1),
                product_id: ProductId::new(1),
                images: String::new(),
                description: "mug".to_string(),
                fragile: true,
                dimensions: "10x10x12".to_string(),
            })
            .await
            .unwrap();
        h.ledger.upsert(record(sku.id, hub.id, quantity)).await.unwrap();
        (hub.id, sku.id)
    }

    async fn quantity(h: &Harness, sku: SkuId, hub: HubId) -> i64 {
        h.store
            .find(InventoryKey::new(sku, hub))
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_upserts_both_succeed() {
        let store = Arc::new(SlowFindStore::default());
        let ledger = Arc::new(InventoryLedger::new(store.clone()));
        let (sku, hub) = (SkuId::new(1), HubId::new(2));

        let first = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.upsert(record(sku, hub, 10)).await }
        });
        let second = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.upsert(record(sku, hub, 20)).await }
        });

        let mut outcomes = vec![first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];
        outcomes.sort_by_key(|o| *o == UpsertOutcome::Updated);
        assert_eq!(outcomes, vec![UpsertOutcome::Created, UpsertOutcome::Updated]);

        let rows = store.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].quantity == 10 || rows[0].quantity == 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_deduct_exactly_once_each() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 40).await;

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let checker = h.checker.clone();
            tasks.push(tokio::spawn(async move {
                checker.check_and_reserve(sku, hub, 2).await
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 20);
        assert_eq!(quantity(&h, sku, hub).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn oversubscribed_reservations_never_go_negative() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 10).await;

        let mut tasks = Vec::new();
        for _ in 0..30 {
            let checker = h.checker.clone();
            tasks.push(tokio::spawn(async move {
                checker.check_and_reserve(sku, hub, 3).await
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(quantity(&h, sku, hub).await, 1);
    }

    #[tokio::test]
    async fn reserve_then_overdraw_leaves_stock_untouched() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 10).await;

        assert_eq!(
            h.checker.try_reserve(sku, hub, 4).await.unwrap(),
            StockStatus::Reserved { remaining: 6 }
        );
        assert!(!h.checker.check_and_reserve(sku, hub, 10).await);
        assert_eq!(quantity(&h, sku, hub).await, 6);
    }

    #[tokio::test]
    async fn upsert_overwrites_rather_than_adds() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 10).await;

        h.ledger.upsert(record(sku, hub, 50)).await.unwrap();

        assert_eq!(quantity(&h, sku, hub).await, 50);
        assert_eq!(h.ledger.list_by_hub(hub).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validation_is_cached_then_evicted_when_hub_is_deleted() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 5).await;
        let key = ValidationCacheKey::new(hub, sku);

        assert!(h.validator.validate(hub, sku).await.unwrap());
        assert_eq!(h.cache.inner.peek(key.as_str()).as_deref(), Some("valid"));

        h.catalog.hubs.delete(hub).await.unwrap();

        assert!(!h.validator.validate(hub, sku).await.unwrap());
        assert_eq!(h.cache.inner.peek(key.as_str()), None);
    }

    #[tokio::test]
    async fn validation_is_evicted_when_sku_is_deleted() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 5).await;
        let key = ValidationCacheKey::new(hub, sku);

        assert!(h.validator.validate(hub, sku).await.unwrap());
        h.catalog.skus.delete(sku).await.unwrap();

        assert!(!h.validator.validate(hub, sku).await.unwrap());
        assert_eq!(h.cache.inner.peek(key.as_str()), None);
    }

    #[tokio::test]
    async fn missing_pair_is_never_cached() {
        let h = harness();
        let (hub, sku) = (HubId::new(9), SkuId::new(9));

        assert!(!h.validator.validate(hub, sku).await.unwrap());
        assert!(!h.validator.validate(hub, sku).await.unwrap());
        assert_eq!(h.cache.inner.peek(ValidationCacheKey::new(hub, sku).as_str()), None);
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_store() {
        let h = harness();
        let (hub, sku) = seed_pair(&h, 5).await;
        h.cache.fail_reads.store(true, Ordering::SeqCst);
        h.cache.fail_writes.store(true, Ordering::SeqCst);

        assert!(h.validator.validate(hub, sku).await.unwrap());
        assert!(!h.validator.validate(HubId::new(77), sku).await.unwrap());
        assert_eq!(h.cache.inner.peek(ValidationCacheKey::new(hub, sku).as_str()), None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Property: sequential reservations succeed exactly while stock
            /// covers them, and the final quantity equals the initial one minus
            /// everything reserved.
            #[test]
            fn reservations_conserve_stock(
                initial in 0i64..200,
                demands in prop::collection::vec(1i64..40, 0..25)
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                rt.block_on(async {
                    let h = harness();
                    let (hub, sku) = seed_pair(&h, initial).await;

                    let mut expected = initial;
                    for demand in &demands {
                        let reserved = h.checker.check_and_reserve(sku, hub, *demand).await;
                        prop_assert_eq!(reserved, expected >= *demand);
                        if reserved {
                            expected -= demand;
                        }
                        prop_assert!(expected >= 0);
                    }
                    prop_assert_eq!(quantity(&h, sku, hub).await, expected);
                    Ok(())
                })?;
            }
        }
    }
}
