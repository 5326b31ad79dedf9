use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    db,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    import,
    models::{CreateProduct, ProductFilters, UpdateProduct},
    AppState,
};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<ProductFilters>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let (release_start, release_end) = filters.release_date_range()?;

    let start = Instant::now();
    let products = db::fetch_all_products(&state.db, &filters, release_start, release_end).await?;
    let elapsed = start.elapsed();

    info!(
        count = products.len(),
        elapsed_ms = elapsed.as_millis(),
        "Listed products"
    );

    state
        .metrics
        .write()
        .await
        .record("list", "products", elapsed, products.len());

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": products,
            "count": products.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    payload.validate()?;

    let start = Instant::now();
    let product = db::insert_product(&state.db, &payload).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("insert", "products", elapsed, 1);

    info!(product_id = %product.product_id, brand = %product.brand_name, "Created product");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": product,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Get by productId ──────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let product = db::fetch_product_by_product_id(&state.db, &product_id).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("get", "products", elapsed, 1);

    info!(product_id = %product_id, "Fetched product");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": product,
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<String>,
    AppJson(payload): AppJson<UpdateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    payload.validate()?;

    let start = Instant::now();
    let product = db::update_product(&state.db, &product_id, &payload).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("update", "products", elapsed, 1);

    info!(product_id = %product_id, "Updated product");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": product,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    db::delete_product(&state.db, &product_id).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("delete", "products", elapsed, 1);

    info!(product_id = %product_id, "Deleted product");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Product deleted",
            "productId": product_id,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Import ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    /// Only clean and map the records; nothing is written.
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn import_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ImportParams>,
    AppJson(items): AppJson<Vec<serde_json::Value>>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if params.dry_run {
        let (records, malformed) = import::clean_source_items(&items);
        info!(valid = records.len(), malformed, "Import dry run");
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({
                "data": records,
                "count": records.len(),
                "skipped_malformed": malformed,
            })),
        ));
    }

    let start = Instant::now();
    let report = import::import_items(&state.db, &items).await?;
    let elapsed = start.elapsed();

    state
        .metrics
        .write()
        .await
        .record("import", "products", elapsed, report.imported);

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "imported": report.imported,
            "skipped_malformed": report.skipped_malformed,
            "skipped_existing": report.skipped_existing,
            "data": report.data,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}
