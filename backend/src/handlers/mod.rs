pub mod brands;
pub mod metrics;
pub mod products;
pub mod seed;

use axum::{http::StatusCode, Json};
use serde_json::json;

pub async fn root() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "message": "Catalog service running. Browse /api/brands and /api/products." })),
    )
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "service": "catalog-service" })))
}
