use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use ims_core::{HubId, SkuId};
use ims_inventory::InventoryRecord;

use crate::app::dto::{self, CheckQuery, ValidationResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_all))
        .route("/upsert", post(upsert))
        .route("/check", get(check))
        .route("/by-hub/:hub_id", get(list_by_hub))
        .route("/by-sku/:sku_id", get(list_by_sku))
        .route("/:sku_id/:hub_id", get(get_one))
}

pub async fn upsert(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<InventoryRecord>, JsonRejection>,
) -> axum::response::Response {
    let Json(record) = match body {
        Ok(b) => b,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_payload", e.body_text())
        }
    };

    match services.ledger.upsert(record).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Inventory upserted successfully",
                "outcome": outcome,
            })),
        )
            .into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_all(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger.list_all().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_by_hub(
    Extension(services): Extension<Arc<AppServices>>,
    Path(hub_id): Path<String>,
) -> axum::response::Response {
    let hub_id: HubId = match dto::parse_id("hub_id", &hub_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.list_by_hub(hub_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_by_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku_id): Path<String>,
) -> axum::response::Response {
    let sku_id: SkuId = match dto::parse_id("sku_id", &sku_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.list_by_sku(sku_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path((sku_id, hub_id)): Path<(String, String)>,
) -> axum::response::Response {
    let sku_id: SkuId = match dto::parse_id("sku_id", &sku_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let hub_id: HubId = match dto::parse_id("hub_id", &hub_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get(sku_id, hub_id).await {
        Ok(row) => Json(row).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

/// Check-and-reserve: 200 when `quantity` units were deducted, 404 otherwise.
pub async fn check(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<CheckQuery>,
) -> axum::response::Response {
    let sku_id: SkuId = match dto::required("sku_id", query.sku_id.as_deref())
        .and_then(|raw| dto::parse_id("sku_id", raw))
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let hub_id: HubId = match dto::required("hub_id", query.hub_id.as_deref())
        .and_then(|raw| dto::parse_id("hub_id", raw))
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let quantity: i64 = match query.quantity.as_deref().map(|q| q.trim().parse()) {
        Some(Ok(q)) => q,
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "quantity must be an integer",
            )
        }
    };

    tracing::info!(%sku_id, %hub_id, quantity, "checking inventory");
    if services.checker.check_and_reserve(sku_id, hub_id, quantity).await {
        (
            StatusCode::OK,
            Json(ValidationResponse::new(true, "Inventory is available")),
        )
            .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ValidationResponse::new(false, "Inventory is not available")),
        )
            .into_response()
    }
}
