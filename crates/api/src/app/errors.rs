use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ims_catalog::CatalogError;
use ims_inventory::InventoryError;

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    match err {
        InventoryError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        InventoryError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        InventoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        InventoryError::Store(msg) => {
            tracing::error!(error = %msg, "inventory store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        CatalogError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        CatalogError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        CatalogError::Store(msg) => {
            tracing::error!(error = %msg, "catalog store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
