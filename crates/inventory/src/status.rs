//! "Can hub H satisfy quantity Q of SKU S right now", with reservation.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use ims_core::{HubId, SkuId};

use crate::error::{InventoryError, InventoryResult};
use crate::ledger::InventoryLedger;
use crate::record::InventoryKey;

/// Outcome of a stock check. Insufficient stock is not an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockStatus {
    /// The demanded quantity was deducted; `remaining` is the committed quantity.
    Reserved { remaining: i64 },
    /// Nothing was deducted; `available` is the quantity observed.
    Insufficient { available: i64 },
}

impl StockStatus {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }
}

/// Check-and-reserve entry point composed over the ledger.
///
/// The first read is unlocked and only short-circuits obviously insufficient
/// requests. The persisted decrement is computed from the quantity read under
/// the row lock inside [`InventoryLedger::reserve`].
#[derive(Clone)]
pub struct StatusChecker {
    ledger: Arc<InventoryLedger>,
}

impl StatusChecker {
    pub fn new(ledger: Arc<InventoryLedger>) -> Self {
        Self { ledger }
    }

    /// Check availability and deduct on success, reporting store failures.
    pub async fn try_reserve(
        &self,
        sku_id: SkuId,
        hub_id: HubId,
        demanded: i64,
    ) -> InventoryResult<StockStatus> {
        if demanded <= 0 {
            return Err(InventoryError::validation("quantity must be positive"));
        }

        let row = self.ledger.get(sku_id, hub_id).await?;
        if row.quantity < demanded {
            info!(%sku_id, %hub_id, available = row.quantity, demanded, "inventory check failed");
            return Ok(StockStatus::Insufficient {
                available: row.quantity,
            });
        }

        info!(%sku_id, %hub_id, available = row.quantity, demanded, "inventory check passed");
        self.ledger
            .reserve(InventoryKey::new(sku_id, hub_id), demanded)
            .await
    }

    /// `true` only when the demanded quantity was deducted and committed.
    ///
    /// Never fails: missing rows, store errors and failed deductions all
    /// report `false`.
    pub async fn check_and_reserve(&self, sku_id: SkuId, hub_id: HubId, demanded: i64) -> bool {
        match self.try_reserve(sku_id, hub_id, demanded).await {
            Ok(status) => status.is_reserved(),
            Err(e) => {
                warn!(%sku_id, %hub_id, demanded, error = %e, "inventory reservation unavailable");
                false
            }
        }
    }
}
