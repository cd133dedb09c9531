//! Durable accounting of stock quantity and price per (sku, hub).

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use ims_core::{HubId, SkuId};

use crate::error::{InventoryError, InventoryResult};
use crate::ports::{InventoryStore, StockTransaction};
use crate::record::{InventoryKey, InventoryRecord};
use crate::status::StockStatus;

/// What an upsert did to the ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Result of a locked read-decide-write cycle.
enum Locked {
    Written { current: i64 },
    Unchanged { current: i64 },
}

/// Inventory ledger: upsert by natural key and row-locked decrements.
///
/// ## Concurrency
///
/// Quantity mutations run inside a store transaction that takes the row lock
/// before reading, so two decrements of the same pair serialize and the
/// second one observes the first one's committed quantity. Values read
/// outside a transaction (`get`, `list_*`) are advisory and never feed a
/// persisted decrement.
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn InventoryStore>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Create the row for the pair, or fully overwrite quantity and price of
    /// the existing one (last write wins, not additive).
    pub async fn upsert(&self, record: InventoryRecord) -> InventoryResult<UpsertOutcome> {
        record.validate()?;

        let key = record.key();
        match self.store.find(key).await? {
            None => match self.store.insert(&record).await {
                Ok(()) => {
                    info!(%key, quantity = record.quantity, unit_price = record.unit_price, "inventory created");
                    Ok(UpsertOutcome::Created)
                }
                // A concurrent upsert created the row after our `find`.
                Err(InventoryError::Conflict(reason)) => {
                    debug!(%key, %reason, "inventory created concurrently, overwriting");
                    self.store.overwrite(&record).await?;
                    info!(%key, quantity = record.quantity, unit_price = record.unit_price, "inventory overwritten");
                    Ok(UpsertOutcome::Updated)
                }
                Err(e) => Err(e),
            },
            Some(_) => {
                self.store.overwrite(&record).await?;
                info!(%key, quantity = record.quantity, unit_price = record.unit_price, "inventory overwritten");
                Ok(UpsertOutcome::Updated)
            }
        }
    }

    /// Fetch the row for one pair; absence is `NotFound`.
    pub async fn get(&self, sku_id: SkuId, hub_id: HubId) -> InventoryResult<InventoryRecord> {
        self.store
            .find(InventoryKey::new(sku_id, hub_id))
            .await?
            .ok_or(InventoryError::NotFound { sku_id, hub_id })
    }

    pub async fn list_all(&self) -> InventoryResult<Vec<InventoryRecord>> {
        self.store.list_all().await
    }

    pub async fn list_by_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>> {
        self.store.list_by_hub(hub_id).await
    }

    pub async fn list_by_sku(&self, sku_id: SkuId) -> InventoryResult<Vec<InventoryRecord>> {
        self.store.list_by_sku(sku_id).await
    }

    /// Subtract `amount` from the pair's quantity under the row lock.
    ///
    /// No floor check: the result may go negative. A result outside `i64` is
    /// rejected as `Validation` and nothing is written. Returns the committed
    /// quantity.
    pub async fn deduct(&self, key: InventoryKey, amount: i64) -> InventoryResult<i64> {
        info!(%key, amount, "deducting inventory");
        let outcome = self
            .apply_locked(key, |current| checked_remaining(current, amount).map(Some))
            .await?;
        match outcome {
            Locked::Written { current } | Locked::Unchanged { current } => Ok(current),
        }
    }

    /// Subtract `amount` only if the locked quantity still covers it.
    ///
    /// The floor check and the write happen under the same lock, so any
    /// number of concurrent reservations can never commit more than the
    /// quantity present when they started.
    pub async fn reserve(&self, key: InventoryKey, amount: i64) -> InventoryResult<StockStatus> {
        info!(%key, amount, "reserving inventory");
        let outcome = self
            .apply_locked(key, |current| {
                if current < amount {
                    return Ok(None);
                }
                checked_remaining(current, amount).map(Some)
            })
            .await?;

        Ok(match outcome {
            Locked::Written { current } => StockStatus::Reserved { remaining: current },
            Locked::Unchanged { current } => StockStatus::Insufficient { available: current },
        })
    }

    /// Begin, lock, decide, write, commit. Any failure after `begin` rolls the
    /// transaction back before the error is returned.
    async fn apply_locked<F>(&self, key: InventoryKey, decide: F) -> InventoryResult<Locked>
    where
        F: FnOnce(i64) -> InventoryResult<Option<i64>> + Send,
    {
        let mut tx = self.store.begin_stock_transaction().await?;

        let current = match tx.lock_quantity(key).await {
            Ok(q) => q,
            Err(e) => {
                error!(%key, error = %e, "failed to lock inventory row");
                rollback_quietly(tx, key).await;
                return Err(e);
            }
        };

        let decision = match decide(current) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(%key, current, error = %e, "rejected inventory change");
                rollback_quietly(tx, key).await;
                return Err(e);
            }
        };

        let Some(next) = decision else {
            debug!(%key, current, "locked quantity does not cover request");
            rollback_quietly(tx, key).await;
            return Ok(Locked::Unchanged { current });
        };

        if let Err(e) = tx.write_quantity(key, next).await {
            error!(%key, error = %e, "failed to write inventory quantity");
            rollback_quietly(tx, key).await;
            return Err(e);
        }

        tx.commit().await.map_err(|e| {
            error!(%key, error = %e, "inventory commit failed");
            e
        })?;

        info!(%key, previous = current, current = next, "inventory updated");
        Ok(Locked::Written { current: next })
    }
}

fn checked_remaining(current: i64, amount: i64) -> InventoryResult<i64> {
    current.checked_sub(amount).ok_or_else(|| {
        InventoryError::validation(format!("subtracting {amount} from {current} overflows"))
    })
}

async fn rollback_quietly(tx: Box<dyn StockTransaction>, key: InventoryKey) {
    if let Err(e) = tx.rollback().await {
        error!(%key, error = %e, "inventory rollback failed");
    }
}
