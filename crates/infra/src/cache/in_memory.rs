use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ims_inventory::{CacheError, ValidationCache};

/// In-memory validation cache for tests/dev. Entries never expire.
#[derive(Debug, Default)]
pub struct InMemoryValidationCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value under `key`, bypassing the async trait.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl ValidationCache for InMemoryValidationCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

fn poisoned() -> CacheError {
    CacheError::Unavailable("in-memory cache lock poisoned".to_string())
}
