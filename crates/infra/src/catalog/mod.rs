//! `CatalogRepository` and `CatalogLookup` adapters.

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryCatalog, InMemoryCatalogRepository};
pub use postgres::{PgCatalogRow, PostgresCatalog, PostgresCatalogRepository};
