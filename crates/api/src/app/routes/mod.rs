use axum::Router;

use ims_catalog::{Hub, Product, Seller, Tenant};

pub mod catalog;
pub mod inventory;
pub mod system;
pub mod validators;

/// Router for everything under `/api/v1`.
pub fn router() -> Router {
    Router::new()
        .nest("/validators", validators::router())
        .nest("/inventory", inventory::router())
        .nest("/hubs", catalog::router::<Hub>())
        .nest("/tenants", catalog::router::<Tenant>())
        .nest("/sellers", catalog::router::<Seller>())
        .nest("/products", catalog::router::<Product>())
        .nest("/skus", catalog::sku_router())
}
