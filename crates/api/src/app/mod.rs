//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: adapter selection (in-memory or Postgres/Redis) and the
//!   inventory/catalog services built on top
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and id parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over already-wired services.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/", get(routes::system::home))
        .route("/health", get(routes::system::health))
        .nest("/api/v1", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_id_middleware))
                .layer(Extension(services)),
        )
}
