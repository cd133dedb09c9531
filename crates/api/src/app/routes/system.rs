use axum::{http::StatusCode, response::IntoResponse, Json};

pub async fn home() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Welcome to the IMS Service",
    }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
