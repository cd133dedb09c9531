use thiserror::Error;

use ims_core::{DomainError, HubId, SkuId};

/// Result type used by the inventory ports and services.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Inventory operation error.
///
/// Insufficient stock is deliberately absent: it is a business outcome
/// (see [`crate::StockStatus`]), not a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// No inventory row exists for the (sku, hub) pair.
    #[error("no inventory for sku {sku_id} at hub {hub_id}")]
    NotFound { sku_id: SkuId, hub_id: HubId },

    /// Input rejected before touching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Constraint violation, e.g. a racing insert of the same pair.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Connection failure, transaction abort or any other backend error.
    #[error("store error: {0}")]
    Store(String),
}

impl InventoryError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DomainError> for InventoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::NotFound => Self::Store("unexpected domain not-found".to_string()),
        }
    }
}

/// Validation cache failure.
///
/// Never surfaced to callers of the validator; it only decides whether the
/// fast path is taken.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}
