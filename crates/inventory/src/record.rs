use serde::{Deserialize, Serialize};

use ims_core::{DomainError, DomainResult, HubId, SkuId};

/// Natural key of an inventory row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    pub sku_id: SkuId,
    pub hub_id: HubId,
}

impl InventoryKey {
    pub fn new(sku_id: SkuId, hub_id: HubId) -> Self {
        Self { sku_id, hub_id }
    }
}

impl core::fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sku {} @ hub {}", self.sku_id, self.hub_id)
    }
}

/// Stock and price held for one SKU at one hub.
///
/// `unit_price` is in minor currency units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub sku_id: SkuId,
    pub hub_id: HubId,
    pub quantity: i64,
    pub unit_price: i64,
}

impl InventoryRecord {
    pub fn new(sku_id: SkuId, hub_id: HubId, quantity: i64, unit_price: i64) -> Self {
        Self {
            sku_id,
            hub_id,
            quantity,
            unit_price,
        }
    }

    pub fn key(&self) -> InventoryKey {
        InventoryKey::new(self.sku_id, self.hub_id)
    }

    /// Reject values the schema's check constraints would refuse.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if self.unit_price < 0 {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        Ok(())
    }
}
