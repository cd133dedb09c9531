//! Catalog module: tenants, hubs, sellers, products and SKUs.
//!
//! Plain entity CRUD. The only cross-module use is hub/SKU existence, which
//! the inventory pair validator consults through its own port.

pub mod entities;
pub mod error;
pub mod repository;
pub mod service;

pub use entities::{CatalogEntity, Hub, Product, Seller, Sku, Tenant};
pub use error::{CatalogError, CatalogResult};
pub use repository::{CatalogRepository, SkuFilter, SkuSearch};
pub use service::CatalogService;
