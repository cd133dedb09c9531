//! `ims-core`: shared building blocks for the inventory service.
//!
//! This crate contains **pure** primitives (no infrastructure concerns):
//! strongly-typed identifiers and the domain error model.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, HubId, ProductId, SellerId, SkuId, TenantId};
