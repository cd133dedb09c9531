//! `ValidationCache` adapters.

mod in_memory;
#[cfg(feature = "redis")]
mod redis_cache;

pub use in_memory::InMemoryValidationCache;
#[cfg(feature = "redis")]
pub use redis_cache::RedisValidationCache;
