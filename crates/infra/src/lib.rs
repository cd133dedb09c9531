//! Infrastructure layer: Postgres, Redis and in-memory adapters for the
//! inventory and catalog ports.

pub mod cache;
pub mod catalog;
pub mod db;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use cache::InMemoryValidationCache;
#[cfg(feature = "redis")]
pub use cache::RedisValidationCache;
pub use catalog::{
    InMemoryCatalog, InMemoryCatalogRepository, PostgresCatalog, PostgresCatalogRepository,
};
pub use db::{DbSettings, connect, ensure_schema};
pub use store::{InMemoryInventoryStore, PostgresInventoryStore};
