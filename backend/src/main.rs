use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod import;
mod metrics;
mod models;
mod seed;

use crate::config::Config;
use crate::error::AppError;
use crate::metrics::MetricsStore;

/// Shared application state — cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub metrics: Arc<RwLock<MetricsStore>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,catalog_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Catalog Service — brands & products over PostgreSQL");

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    db::run_migrations(&pool).await?;
    info!("Migrations complete.");

    if config.seed_on_startup {
        match seed::seed_catalog(&pool).await {
            Ok(report) => info!(
                brands = report.brands.len(),
                products = report.products.len(),
                "Seeded catalog on startup"
            ),
            Err(AppError::Conflict(reason)) => {
                warn!(%reason, "Seed skipped: catalog already contains seed rows")
            }
            Err(e) => return Err(e.into()),
        }
    }

    let state = AppState {
        db: pool,
        metrics: Arc::new(RwLock::new(MetricsStore::new())),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))

        // ── Brands ──────────────────────────────────────────────────────────
        .route(
            "/api/brands",
            get(handlers::brands::list_brands).post(handlers::brands::create_brand),
        )
        .route(
            "/api/brands/:id",
            get(handlers::brands::get_brand)
                .put(handlers::brands::update_brand)
                .delete(handlers::brands::delete_brand),
        )
        .route(
            "/api/brands/:id/products",
            get(handlers::brands::list_brand_products),
        )

        // ── Products ────────────────────────────────────────────────────────
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/products/import",
            post(handlers::products::import_products),
        )
        .route(
            "/api/products/:product_id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )

        // ── Seed ────────────────────────────────────────────────────────────
        .route("/api/seed", post(handlers::seed::seed_data))

        // ── Metrics ─────────────────────────────────────────────────────────
        .route(
            "/api/metrics",
            get(handlers::metrics::get_metrics).delete(handlers::metrics::clear_metrics),
        )
        .route("/api/metrics/export/csv", get(handlers::metrics::export_csv))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
