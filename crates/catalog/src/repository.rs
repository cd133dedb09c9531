//! Catalog persistence boundary.

use async_trait::async_trait;
use serde::Deserialize;

use ims_core::{ProductId, SellerId};

use crate::entities::{CatalogEntity, Sku};
use crate::error::CatalogResult;

/// CRUD storage for one catalog entity kind.
///
/// Implementations must:
/// - assign a fresh id on `create`, ignoring the incoming one
/// - fail `update` and `delete` with `NotFound` when the row is absent
/// - return rows from `list` in ascending id order
#[async_trait]
pub trait CatalogRepository<E: CatalogEntity>: Send + Sync {
    async fn list(&self) -> CatalogResult<Vec<E>>;

    async fn get(&self, id: E::Id) -> CatalogResult<E>;

    /// Insert `entity` and return it carrying its new id.
    async fn create(&self, entity: E) -> CatalogResult<E>;

    /// Replace every field of the row identified by `entity.id()`.
    async fn update(&self, entity: E) -> CatalogResult<E>;

    /// Remove the row and return what was removed.
    async fn delete(&self, id: E::Id) -> CatalogResult<E>;
}

/// Optional SKU list filters; unset fields match everything.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SkuFilter {
    pub seller_id: Option<SellerId>,
    pub product_id: Option<ProductId>,
}

impl SkuFilter {
    pub fn matches(&self, sku: &Sku) -> bool {
        self.seller_id.is_none_or(|id| sku.seller_id == id)
            && self.product_id.is_none_or(|id| sku.product_id == id)
    }
}

#[async_trait]
pub trait SkuSearch: Send + Sync {
    async fn search_skus(&self, filter: SkuFilter) -> CatalogResult<Vec<Sku>>;
}
