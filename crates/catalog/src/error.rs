use thiserror::Error;

use ims_core::DomainError;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog repository/service error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("validation failed: {0}")]
    Validation(String),

    /// Constraint violation (duplicate key, dangling reference).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(String),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::NotFound => Self::Store("unexpected domain not-found".to_string()),
        }
    }
}
