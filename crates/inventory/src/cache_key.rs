//! Deterministic cache keys for memoized pair validations.

use ims_core::{HubId, SkuId};

/// Value stored under a validation key. Only positive outcomes are cached.
pub const VALID_MARKER: &str = "valid";

/// Cache key for a (hub, sku) pair: `hub:<hub_id>:sku:<sku_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationCacheKey(String);

impl ValidationCacheKey {
    pub fn new(hub_id: HubId, sku_id: SkuId) -> Self {
        Self(format!("hub:{hub_id}:sku:{sku_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ValidationCacheKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
