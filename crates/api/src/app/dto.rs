use std::str::FromStr;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Query of `GET /inventory/check`. Fields stay raw so that a missing or
/// malformed value maps to our own JSON error instead of an extractor
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub sku_id: Option<String>,
    pub hub_id: Option<String>,
    pub quantity: Option<String>,
}

/// Query of `GET /skus`.
#[derive(Debug, Default, Deserialize)]
pub struct SkuListQuery {
    pub seller_id: Option<String>,
    pub product_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationResponse {
    pub fn new(is_valid: bool, message: impl Into<String>) -> Self {
        Self {
            is_valid,
            message: message.into(),
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

/// Parse a path or query id, answering 400 `invalid_id` on failure.
pub fn parse_id<T>(name: &str, raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {name}")))
}

/// Like [`parse_id`] for an optional query value.
pub fn parse_optional_id<T>(name: &str, raw: Option<&str>) -> Result<Option<T>, axum::response::Response>
where
    T: FromStr,
{
    raw.filter(|v| !v.is_empty())
        .map(|v| parse_id(name, v))
        .transpose()
}

pub fn required<'a>(name: &str, raw: Option<&'a str>) -> Result<&'a str, axum::response::Response> {
    raw.ok_or_else(|| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("missing {name}"))
    })
}
