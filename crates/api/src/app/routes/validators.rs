use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use ims_core::{HubId, SkuId};

use crate::app::dto::{self, ValidationResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/validate_order/:sku_id/:hub_id", get(validate_order))
}

/// 200 when the pair has inventory and both rows still exist, 400 when it
/// does not, 500 when the store could not answer.
pub async fn validate_order(
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

    match services.validator.validate(hub_id, sku_id).await {
        Ok(true) => {
            tracing::info!(%sku_id, %hub_id, "order validation passed");
            (
                StatusCode::OK,
                Json(ValidationResponse::new(true, "Hub and SKU validated successfully")),
            )
                .into_response()
        }
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(ValidationResponse::new(false, "Invalid SKU or Hub")),
        )
            .into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
