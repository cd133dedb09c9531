//! Service wiring: picks in-memory or Postgres/Redis adapters and builds the
//! application services handlers share through an `Extension`.

use std::sync::Arc;

use anyhow::Context;

use ims_catalog::{CatalogRepository, CatalogService, Hub, Product, Seller, Sku, SkuSearch, Tenant};
use ims_infra::{
    InMemoryCatalog, InMemoryInventoryStore, InMemoryValidationCache, PostgresCatalog,
    PostgresInventoryStore, RedisValidationCache,
};
use ims_inventory::{
    CatalogLookup, InventoryLedger, InventoryStore, PairValidator, StatusChecker, ValidationCache,
};

use crate::config::{AppConfig, StorageConfig};

#[derive(Clone)]
pub struct AppServices {
    pub ledger: Arc<InventoryLedger>,
    pub validator: PairValidator,
    pub checker: StatusChecker,
    pub tenants: CatalogService<Tenant>,
    pub hubs: CatalogService<Hub>,
    pub sellers: CatalogService<Seller>,
    pub products: CatalogService<Product>,
    pub skus: CatalogService<Sku>,
    pub sku_search: Arc<dyn SkuSearch>,
}

/// Adapters behind the services, independent of which backend provides them.
struct Backends {
    store: Arc<dyn InventoryStore>,
    lookup: Arc<dyn CatalogLookup>,
    cache: Arc<dyn ValidationCache>,
    tenants: Arc<dyn CatalogRepository<Tenant>>,
    hubs: Arc<dyn CatalogRepository<Hub>>,
    sellers: Arc<dyn CatalogRepository<Seller>>,
    products: Arc<dyn CatalogRepository<Product>>,
    skus: Arc<dyn CatalogRepository<Sku>>,
    sku_search: Arc<dyn SkuSearch>,
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.storage {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory())
        }
        StorageConfig::Persistent { db, redis_url } => {
            let pool = ims_infra::connect(db)
                .await
                .context("failed to connect to Postgres")?;
            ims_infra::ensure_schema(&pool)
                .await
                .context("failed to apply database schema")?;
            let cache = RedisValidationCache::connect(redis_url)
                .await
                .context("failed to connect to Redis")?;
            tracing::info!(max_connections = db.max_connections, "using Postgres + Redis stores");

            let catalog = PostgresCatalog::new(pool.clone());
            Ok(AppServices::from_backends(Backends {
                store: Arc::new(PostgresInventoryStore::new(pool)),
                lookup: Arc::new(catalog.clone()),
                cache: Arc::new(cache),
                tenants: catalog.tenants,
                hubs: catalog.hubs,
                sellers: catalog.sellers,
                products: catalog.products,
                skus: catalog.skus.clone(),
                sku_search: catalog.skus,
            }))
        }
    }
}

impl AppServices {
    /// Everything process-local (dev/test).
    pub fn in_memory() -> Self {
        let catalog = InMemoryCatalog::new();
        Self::from_backends(Backends {
            store: Arc::new(InMemoryInventoryStore::new()),
            lookup: Arc::new(catalog.clone()),
            cache: Arc::new(InMemoryValidationCache::new()),
            tenants: catalog.tenants,
            hubs: catalog.hubs,
            sellers: catalog.sellers,
            products: catalog.products,
            skus: catalog.skus.clone(),
            sku_search: catalog.skus,
        })
    }

    fn from_backends(b: Backends) -> Self {
        let ledger = Arc::new(InventoryLedger::new(b.store.clone()));
        Self {
            validator: PairValidator::new(b.store, b.lookup, b.cache),
            checker: StatusChecker::new(ledger.clone()),
            ledger,
            tenants: CatalogService::new(b.tenants),
            hubs: CatalogService::new(b.hubs),
            sellers: CatalogService::new(b.sellers),
            products: CatalogService::new(b.products),
            skus: CatalogService::new(b.skus),
            sku_search: b.sku_search,
        }
    }
}
