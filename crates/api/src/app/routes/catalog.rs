//! CRUD routes shared by the five catalog entities.
//!
//! Every kind gets `GET /`, `POST /`, `GET /:id`, `PUT /:id` and
//! `DELETE /:id`; SKUs additionally filter their listing by seller and
//! product.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use ims_catalog::{CatalogEntity, CatalogService, Hub, Product, Seller, Sku, SkuFilter, Tenant};

use crate::app::dto::{self, SkuListQuery};
use crate::app::errors;
use crate::app::services::AppServices;

/// Binds an entity kind to its service and to the label used in messages.
pub trait CatalogResource: CatalogEntity {
    const LABEL: &'static str;

    fn service(services: &AppServices) -> &CatalogService<Self>;
}

impl CatalogResource for Tenant {
    const LABEL: &'static str = "Tenant";

    fn service(services: &AppServices) -> &CatalogService<Self> {
        &services.tenants
    }
}

impl CatalogResource for Hub {
    const LABEL: &'static str = "Hub";

    fn service(services: &AppServices) -> &CatalogService<Self> {
        &services.hubs
    }
}

impl CatalogResource for Seller {
    const LABEL: &'static str = "Seller";

    fn service(services: &AppServices) -> &CatalogService<Self> {
        &services.sellers
    }
}

impl CatalogResource for Product {
    const LABEL: &'static str = "Product";

    fn service(services: &AppServices) -> &CatalogService<Self> {
        &services.products
    }
}

impl CatalogResource for Sku {
    const LABEL: &'static str = "SKU";

    fn service(services: &AppServices) -> &CatalogService<Self> {
        &services.skus
    }
}

pub fn router<E: CatalogResource>() -> Router {
    Router::new()
        .route("/", get(list::<E>).post(create::<E>))
        .route("/:id", get(get_one::<E>).put(update::<E>).delete(delete::<E>))
}

pub fn sku_router() -> Router {
    Router::new()
        .route("/", get(list_skus).post(create::<Sku>))
        .route("/:id", get(get_one::<Sku>).put(update::<Sku>).delete(delete::<Sku>))
}

pub async fn list<E: CatalogResource>(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match E::service(&services).list().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_skus(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<SkuListQuery>,
) -> axum::response::Response {
    let seller_id = match dto::parse_optional_id("seller_id", query.seller_id.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product_id = match dto::parse_optional_id("product_id", query.product_id.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let filter = SkuFilter {
        seller_id,
        product_id,
    };
    match services.sku_search.search_skus(filter).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_one<E: CatalogResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_entity_id::<E>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match E::service(&services).get(id).await {
        Ok(row) => Json(row).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn create<E: CatalogResource>(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<E>, JsonRejection>,
) -> axum::response::Response {
    let Json(entity) = match body {
        Ok(b) => b,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_payload", e.body_text())
        }
    };

    match E::service(&services).create(entity).await {
        Ok(row) => (StatusCode::CREATED, Json(envelope::<E>("created", &row))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update<E: CatalogResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<E>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_entity_id::<E>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(entity) = match body {
        Ok(b) => b,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_payload", e.body_text())
        }
    };

    match E::service(&services).update(id, entity).await {
        Ok(row) => (StatusCode::OK, Json(envelope::<E>("updated", &row))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete<E: CatalogResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_entity_id::<E>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match E::service(&services).delete(id).await {
        Ok(row) => (StatusCode::OK, Json(envelope::<E>("deleted", &row))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

fn parse_entity_id<E: CatalogResource>(raw: &str) -> Result<E::Id, axum::response::Response> {
    let id: i64 = dto::parse_id(&format!("{} id", E::KIND), raw)?;
    Ok(E::Id::from(id))
}

/// `{"message": "<Label> <verb> successfully", "<kind>": row}`
fn envelope<E: CatalogResource>(verb: &str, row: &E) -> Value {
    let mut body = Map::new();
    body.insert(
        "message".to_string(),
        Value::String(format!("{} {verb} successfully", E::LABEL)),
    );
    body.insert(
        E::KIND.to_string(),
        serde_json::to_value(row).unwrap_or(Value::Null),
    );
    Value::Object(body)
}
