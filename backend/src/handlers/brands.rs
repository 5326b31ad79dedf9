use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    db,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    models::{BrandFilters, CreateBrand, UpdateBrand},
    AppState,
};

pub async fn list_brands(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<BrandFilters>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let brands = db::fetch_all_brands(&state.db, &filters).await?;
    let elapsed = start.elapsed();

    info!(count = brands.len(), "Listed brands");
    state
        .metrics
        .write()
        .await
        .record("list", "brands", elapsed, brands.len());

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": brands,
            "count": brands.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn create_brand(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBrand>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    payload.validate()?;

    let start = Instant::now();
    let brand = db::insert_brand(&state.db, &payload).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("insert", "brands", elapsed, 1);
    info!(id = brand.id, name = %brand.name, "Created brand");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": brand,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn get_brand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let brand = db::fetch_brand_by_id(&state.db, id).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("get", "brands", elapsed, 1);

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": brand,
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn update_brand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateBrand>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    payload.validate()?;

    let start = Instant::now();
    let brand = db::update_brand(&state.db, id, &payload).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("update", "brands", elapsed, 1);
    info!(id, "Updated brand");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": brand,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    db::delete_brand(&state.db, id).await?;
    let elapsed = start.elapsed();

    state.metrics.write().await.record("delete", "brands", elapsed, 1);
    info!(id, "Deleted brand");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Brand deleted",
            "id": id,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn list_brand_products(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let products = db::fetch_products_by_brand(&state.db, id).await?;
    let elapsed = start.elapsed();

    state
        .metrics
        .write()
        .await
        .record("list_by_brand", "products", elapsed, products.len());

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": products,
            "count": products.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}
