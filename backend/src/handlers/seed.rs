use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::{db, error::AppResult, seed, AppState};

// ── POST /api/seed ────────────────────────────────────────────────────────────

pub async fn seed_data(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let report = seed::seed_catalog(&state.db).await?;
    let seed_elapsed = start.elapsed();

    let total_brands = db::count_brands(&state.db).await?;
    let total_products = db::count_products(&state.db).await?;

    state.metrics.write().await.record(
        "seed",
        "catalog",
        seed_elapsed,
        report.brands.len() + report.products.len(),
    );

    info!(
        brands = report.brands.len(),
        products = report.products.len(),
        seed_ms = seed_elapsed.as_millis(),
        "Seed request complete"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "brands": report.brands,
            "products": report.products,
            "total_brands": total_brands,
            "total_products": total_products,
            "seed_time_ms": seed_elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}
