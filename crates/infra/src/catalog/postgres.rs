//! Postgres-backed catalog tables.
//!
//! One generic repository serves all five entity kinds; each kind describes
//! its table through [`PgCatalogRow`]. Column lists are static, so the SQL
//! built from them never contains caller input.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use ims_catalog::{
    CatalogEntity, CatalogError, CatalogRepository, CatalogResult, Hub, Product, Seller, Sku,
    SkuFilter, SkuSearch, Tenant,
};
use ims_core::{CategoryId, HubId, ProductId, SellerId, SkuId, TenantId};
use ims_inventory::{CatalogLookup, InventoryError, InventoryResult};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Table mapping for a catalog entity.
pub trait PgCatalogRow: CatalogEntity {
    const TABLE: &'static str;

    /// Every column except `id`, in bind order.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;

    /// Bind the values of [`Self::COLUMNS`], in order.
    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

impl PgCatalogRow for Tenant {
    const TABLE: &'static str = "tenants";
    const COLUMNS: &'static [&'static str] =
        &["tenant_name", "registered_address", "tenant_contact", "tenant_email"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Tenant {
            id: TenantId::new(row.try_get("id")?),
            tenant_name: row.try_get("tenant_name")?,
            registered_address: row.try_get("registered_address")?,
            tenant_contact: row.try_get("tenant_contact")?,
            tenant_email: row.try_get("tenant_email")?,
        })
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.tenant_name.as_str())
            .bind(self.registered_address.as_str())
            .bind(self.tenant_contact.as_str())
            .bind(self.tenant_email.as_str())
    }
}

impl PgCatalogRow for Hub {
    const TABLE: &'static str = "hubs";
    const COLUMNS: &'static [&'static str] =
        &["tenant_id", "manager_name", "manager_contact", "manager_email"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Hub {
            id: HubId::new(row.try_get("id")?),
            tenant_id: TenantId::new(row.try_get("tenant_id")?),
            manager_name: row.try_get("manager_name")?,
            manager_contact: row.try_get("manager_contact")?,
            manager_email: row.try_get("manager_email")?,
        })
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.tenant_id.get())
            .bind(self.manager_name.as_str())
            .bind(self.manager_contact.as_str())
            .bind(self.manager_email.as_str())
    }
}

impl PgCatalogRow for Seller {
    const TABLE: &'static str = "sellers";
    const COLUMNS: &'static [&'static str] = &[
        "hub_id",
        "tenant_id",
        "seller_name",
        "seller_contact",
        "seller_email",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Seller {
            id: SellerId::new(row.try_get("id")?),
            hub_id: HubId::new(row.try_get("hub_id")?),
            tenant_id: TenantId::new(row.try_get("tenant_id")?),
            seller_name: row.try_get("seller_name")?,
            seller_contact: row.try_get("seller_contact")?,
            seller_email: row.try_get("seller_email")?,
        })
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.hub_id.get())
            .bind(self.tenant_id.get())
            .bind(self.seller_name.as_str())
            .bind(self.seller_contact.as_str())
            .bind(self.seller_email.as_str())
    }
}

impl PgCatalogRow for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "product_name",
        "seller_id",
        "general_description",
        "category_id",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            product_name: row.try_get("product_name")?,
            seller_id: SellerId::new(row.try_get("seller_id")?),
            general_description: row.try_get("general_description")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
        })
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.product_name.as_str())
            .bind(self.seller_id.get())
            .bind(self.general_description.as_str())
            .bind(self.category_id.get())
    }
}

impl PgCatalogRow for Sku {
    const TABLE: &'static str = "skus";
    const COLUMNS: &'static [&'static str] = &[
        "seller_id",
        "product_id",
        "images",
        "description",
        "fragile",
        "dimensions",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Sku {
            id: SkuId::new(row.try_get("id")?),
            seller_id: SellerId::new(row.try_get("seller_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            images: row.try_get("images")?,
            description: row.try_get("description")?,
            fragile: row.try_get("fragile")?,
            dimensions: row.try_get("dimensions")?,
        })
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.seller_id.get())
            .bind(self.product_id.get())
            .bind(self.images.as_str())
            .bind(self.description.as_str())
            .bind(self.fragile)
            .bind(self.dimensions.as_str())
    }
}

/// Generic CRUD over one catalog table.
#[derive(Debug)]
pub struct PostgresCatalogRepository<E> {
    pool: Arc<PgPool>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PostgresCatalogRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: PgCatalogRow> PostgresCatalogRepository<E> {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT id, {} FROM {} {} ORDER BY id",
            E::COLUMNS.join(", "),
            E::TABLE,
            filter
        )
    }

    fn decode(row: &PgRow) -> CatalogResult<E> {
        E::from_row(row).map_err(|e| map_sqlx_error(E::KIND, "decode", e))
    }
}

#[async_trait]
impl<E: PgCatalogRow> CatalogRepository<E> for PostgresCatalogRepository<E> {
    #[instrument(skip(self), fields(kind = E::KIND), err)]
    async fn list(&self) -> CatalogResult<Vec<E>> {
        let sql = Self::select_sql("");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::KIND, "list", e))?;

        rows.iter().map(Self::decode).collect()
    }

    #[instrument(skip(self), fields(kind = E::KIND, id = %id), err)]
    async fn get(&self, id: E::Id) -> CatalogResult<E> {
        let sql = Self::select_sql("WHERE id = $1");
        let id_value: i64 = id.into();
        let row = sqlx::query(&sql)
            .bind(id_value)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::KIND, "get", e))?
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))?;

        Self::decode(&row)
    }

    #[instrument(skip(self, entity), fields(kind = E::KIND), err)]
    async fn create(&self, entity: E) -> CatalogResult<E> {
        let placeholders: Vec<String> = (1..=E::COLUMNS.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            E::TABLE,
            E::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let id: i64 = entity
            .bind_columns(sqlx::query(&sql))
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get("id"))
            .map_err(|e| map_sqlx_error(E::KIND, "create", e))?;

        Ok(entity.with_id(E::Id::from(id)))
    }

    #[instrument(skip(self, entity), fields(kind = E::KIND, id = %entity.id()), err)]
    async fn update(&self, entity: E) -> CatalogResult<E> {
        let assignments: Vec<String> = E::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ${}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ${}",
            E::TABLE,
            assignments.join(", "),
            E::COLUMNS.len() + 1
        );

        let id = entity.id();
        let id_value: i64 = id.into();
        let result = entity
            .bind_columns(sqlx::query(&sql))
            .bind(id_value)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::KIND, "update", e))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(E::KIND, id));
        }
        Ok(entity)
    }

    #[instrument(skip(self), fields(kind = E::KIND, id = %id), err)]
    async fn delete(&self, id: E::Id) -> CatalogResult<E> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING id, {}",
            E::TABLE,
            E::COLUMNS.join(", ")
        );
        let id_value: i64 = id.into();
        let row = sqlx::query(&sql)
            .bind(id_value)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::KIND, "delete", e))?
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))?;

        Self::decode(&row)
    }
}

#[async_trait]
impl SkuSearch for PostgresCatalogRepository<Sku> {
    #[instrument(skip(self), err)]
    async fn search_skus(&self, filter: SkuFilter) -> CatalogResult<Vec<Sku>> {
        let sql = Self::select_sql(
            "WHERE ($1::BIGINT IS NULL OR seller_id = $1) \
             AND ($2::BIGINT IS NULL OR product_id = $2)",
        );
        let rows = sqlx::query(&sql)
            .bind(filter.seller_id.map(SellerId::get))
            .bind(filter.product_id.map(ProductId::get))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(Sku::KIND, "search", e))?;

        rows.iter().map(Self::decode).collect()
    }
}

/// The five Postgres catalog tables over one pool, plus the existence checks
/// the pair validator needs.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: Arc<PgPool>,
    pub tenants: Arc<PostgresCatalogRepository<Tenant>>,
    pub hubs: Arc<PostgresCatalogRepository<Hub>>,
    pub sellers: Arc<PostgresCatalogRepository<Seller>>,
    pub products: Arc<PostgresCatalogRepository<Product>>,
    pub skus: Arc<PostgresCatalogRepository<Sku>>,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);
        Self {
            tenants: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            hubs: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            sellers: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            products: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            skus: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            pool,
        }
    }

    async fn row_exists(&self, table: &str, id: i64) -> InventoryResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| InventoryError::store(format!("existence check on {table}: {e}")))
    }
}

#[async_trait]
impl CatalogLookup for PostgresCatalog {
    #[instrument(skip(self), err)]
    async fn hub_exists(&self, hub_id: HubId) -> InventoryResult<bool> {
        self.row_exists(Hub::TABLE, hub_id.get()).await
    }

    #[instrument(skip(self), err)]
    async fn sku_exists(&self, sku_id: SkuId) -> InventoryResult<bool> {
        self.row_exists(Sku::TABLE, sku_id.get()).await
    }
}

/// Map SQLx errors to catalog errors with entity and operation context.
fn map_sqlx_error(kind: &str, operation: &str, err: sqlx::Error) -> CatalogError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {kind} {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") => CatalogError::Conflict(msg),
                Some("23502") | Some("23514") => CatalogError::Validation(msg),
                _ => CatalogError::Store(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            CatalogError::store(format!("connection pool closed in {kind} {operation}"))
        }
        _ => CatalogError::store(format!("sqlx error in {kind} {operation}: {err}")),
    }
}
