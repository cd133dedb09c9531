//! `InventoryStore` adapters.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::{PostgresInventoryStore, PostgresStockTransaction};
