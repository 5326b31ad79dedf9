use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgExecutor, PgPool, Postgres};

use crate::error::{AppError, AppResult};
use crate::models::*;

/// Embedded migrations: `brands` first, then `products` (FK ordering).
/// Applied versions are tracked, so running this against an initialized store is a no-op.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("migration failed")))
}

// ── Brands ────────────────────────────────────────────────────────────────────

const BRAND_COLUMNS: &str =
    "id, name, founded_year, street, city, state, postal_code, country";

pub async fn fetch_all_brands(pool: &PgPool, filters: &BrandFilters) -> AppResult<Vec<Brand>> {
    let limit = filters.limit.unwrap_or(100).clamp(1, 1_000);
    let offset = filters.offset.unwrap_or(0).max(0);

    let brands = sqlx::query_as::<_, Brand>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands ORDER BY name LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(brands)
}

pub async fn fetch_brand_by_id<'e>(executor: impl PgExecutor<'e>, id: i32) -> AppResult<Brand> {
    sqlx::query_as::<_, Brand>(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Brand {} not found", id)))
}

/// Inserts a brand and returns the stored row, including its generated id.
pub async fn insert_brand<'e>(executor: impl PgExecutor<'e>, payload: &CreateBrand) -> AppResult<Brand> {
    let brand = sqlx::query_as::<_, Brand>(&format!(
        r#"
        INSERT INTO brands (name, founded_year, street, city, state, postal_code, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {BRAND_COLUMNS}
        "#
    ))
    .bind(payload.name.trim())
    .bind(payload.founded_year)
    .bind(&payload.street)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.postal_code)
    .bind(&payload.country)
    .fetch_one(executor)
    .await?;

    Ok(brand)
}

/// Returns the id of the brand called `name`, creating a bare brand row if none exists.
pub async fn upsert_brand_by_name<'e>(executor: impl PgExecutor<'e>, name: &str) -> AppResult<i32> {
    let row: (i32,) = sqlx::query_as(
        r#"
        INSERT INTO brands (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name.trim())
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}

pub async fn update_brand(pool: &PgPool, id: i32, payload: &UpdateBrand) -> AppResult<Brand> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Brand>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Brand {} not found", id)))?;

    let brand = sqlx::query_as::<_, Brand>(&format!(
        r#"
        UPDATE brands
        SET name         = $1,
            founded_year = $2,
            street       = $3,
            city         = $4,
            state        = $5,
            postal_code  = $6,
            country      = $7
        WHERE id = $8
        RETURNING {BRAND_COLUMNS}
        "#
    ))
    .bind(payload.name.as_deref().map(str::trim).unwrap_or(&existing.name))
    .bind(payload.founded_year.or(existing.founded_year))
    .bind(payload.street.as_deref().or(existing.street.as_deref()))
    .bind(payload.city.as_deref().or(existing.city.as_deref()))
    .bind(payload.state.as_deref().or(existing.state.as_deref()))
    .bind(payload.postal_code.as_deref().or(existing.postal_code.as_deref()))
    .bind(payload.country.as_deref().or(existing.country.as_deref()))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(brand)
}

/// Deletes a brand. Products restrict the delete: a referenced brand is a conflict.
pub async fn delete_brand(pool: &PgPool, id: i32) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM brands WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::InvalidReference(_) => AppError::Conflict(format!(
                "Brand {} still has products; delete or reassign them first",
                id
            )),
            other => other,
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Brand {} not found", id)));
    }
    Ok(())
}

pub async fn count_brands(pool: &PgPool) -> AppResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM brands")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

// ── Products ──────────────────────────────────────────────────────────────────

/// Product columns joined with the owning brand's name; expects aliases `p` and `b`.
const PRODUCT_COLUMNS: &str = "p.id, p.product_id, p.name, p.brand_id, b.name AS brand_name, \
     p.category, p.description, p.price, p.currency, p.discount_percentage, \
     p.stock_quantity, p.warehouse_location, p.sku, p.processor, p.memory, \
     p.storage_capacity, p.display_size, p.is_available, p.release_date, p.last_updated, \
     p.average_rating, p.rating_count, p.warranty_months, p.weight_kg";

pub async fn fetch_all_products(
    pool: &PgPool,
    filters: &ProductFilters,
    release_start: Option<NaiveDate>,
    release_end: Option<NaiveDate>,
) -> AppResult<Vec<Product>> {
    let limit = filters.limit.unwrap_or(100).clamp(1, 1_000);
    let offset = filters.offset.unwrap_or(0).max(0);

    let products = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products p
        JOIN brands b ON b.id = p.brand_id
        WHERE ($1::text IS NULL OR p.category = $1)
          AND ($2::int IS NULL OR p.brand_id = $2)
          AND ($3::text IS NULL OR b.name = $3)
          AND ($4::numeric IS NULL OR p.price >= $4)
          AND ($5::numeric IS NULL OR p.price <= $5)
          AND ($6::bool IS NULL OR p.is_available = $6)
          AND ($7::date IS NULL OR p.release_date >= $7)
          AND ($8::date IS NULL OR p.release_date <= $8)
        ORDER BY p.id
        LIMIT $9 OFFSET $10
        "#
    ))
    .bind(filters.category.as_deref())
    .bind(filters.brand_id)
    .bind(filters.brand.as_deref())
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(filters.available)
    .bind(release_start)
    .bind(release_end)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn fetch_products_by_brand(pool: &PgPool, brand_id: i32) -> AppResult<Vec<Product>> {
    fetch_brand_by_id(pool, brand_id).await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products p
        JOIN brands b ON b.id = p.brand_id
        WHERE p.brand_id = $1
        ORDER BY p.id
        "#
    ))
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn fetch_product_by_product_id<'e>(
    executor: impl PgExecutor<'e>,
    product_id: &str,
) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products p
        JOIN brands b ON b.id = p.brand_id
        WHERE p.product_id = $1
        "#
    ))
    .bind(product_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))
}

/// Single-statement insert that hands back the joined row. `on_conflict` is spliced in
/// after the VALUES list.
fn insert_product_sql(on_conflict: &str) -> String {
    format!(
        r#"
        WITH p AS (
            INSERT INTO products (
                product_id, name, brand_id, category, description, price, currency,
                discount_percentage, stock_quantity, warehouse_location, sku, processor,
                memory, storage_capacity, display_size, is_available, release_date,
                average_rating, rating_count, warranty_months, weight_kg
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    COALESCE($16, TRUE), $17, $18, $19, $20, $21)
            {on_conflict}
            RETURNING *
        )
        SELECT {PRODUCT_COLUMNS}
        FROM p
        JOIN brands b ON b.id = p.brand_id
        "#
    )
}

fn bind_create_product<'q>(
    query: QueryAs<'q, Postgres, Product, PgArguments>,
    payload: &'q CreateProduct,
) -> QueryAs<'q, Postgres, Product, PgArguments> {
    query
        .bind(payload.product_id.trim())
        .bind(payload.name.trim())
        .bind(payload.brand_id)
        .bind(&payload.category)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(&payload.currency)
        .bind(payload.discount_percentage)
        .bind(payload.stock_quantity)
        .bind(&payload.warehouse_location)
        .bind(&payload.sku)
        .bind(&payload.processor)
        .bind(&payload.memory)
        .bind(&payload.storage_capacity)
        .bind(&payload.display_size)
        .bind(payload.is_available)
        .bind(payload.release_date)
        .bind(payload.average_rating)
        .bind(payload.rating_count)
        .bind(payload.warranty_months)
        .bind(payload.weight_kg)
}

/// Inserts a product. A duplicate `product_id` surfaces as a conflict and an unknown
/// `brand_id` as an invalid reference.
pub async fn insert_product<'e>(
    executor: impl PgExecutor<'e>,
    payload: &CreateProduct,
) -> AppResult<Product> {
    let sql = insert_product_sql("");
    let product = bind_create_product(sqlx::query_as::<_, Product>(&sql), payload)
        .fetch_one(executor)
        .await?;
    Ok(product)
}

/// Like [`insert_product`], but an existing `product_id` yields `None` instead of an error.
pub async fn insert_product_if_absent<'e>(
    executor: impl PgExecutor<'e>,
    payload: &CreateProduct,
) -> AppResult<Option<Product>> {
    let sql = insert_product_sql("ON CONFLICT (product_id) DO NOTHING");
    let product = bind_create_product(sqlx::query_as::<_, Product>(&sql), payload)
        .fetch_optional(executor)
        .await?;
    Ok(product)
}

pub async fn update_product(
    pool: &PgPool,
    product_id: &str,
    payload: &UpdateProduct,
) -> AppResult<Product> {
    let mut tx = pool.begin().await?;

    // Lock the row so concurrent partial updates don't overwrite each other's merge.
    let existing = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products p
        JOIN brands b ON b.id = p.brand_id
        WHERE p.product_id = $1
        FOR UPDATE OF p
        "#
    ))
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        WITH p AS (
            UPDATE products
            SET name                = $1,
                brand_id            = $2,
                category            = $3,
                description         = $4,
                price               = $5,
                currency            = $6,
                discount_percentage = $7,
                stock_quantity      = $8,
                warehouse_location  = $9,
                sku                 = $10,
                processor           = $11,
                memory              = $12,
                storage_capacity    = $13,
                display_size        = $14,
                is_available        = $15,
                release_date        = $16,
                average_rating      = $17,
                rating_count        = $18,
                warranty_months     = $19,
                weight_kg           = $20,
                last_updated        = NOW()
            WHERE id = $21
            RETURNING *
        )
        SELECT {PRODUCT_COLUMNS}
        FROM p
        JOIN brands b ON b.id = p.brand_id
        "#
    ))
    .bind(payload.name.as_deref().map(str::trim).unwrap_or(&existing.name))
    .bind(payload.brand_id.unwrap_or(existing.brand_id))
    .bind(payload.category.as_deref().or(existing.category.as_deref()))
    .bind(payload.description.as_deref().or(existing.description.as_deref()))
    .bind(payload.price.or(existing.price))
    .bind(payload.currency.as_deref().or(existing.currency.as_deref()))
    .bind(payload.discount_percentage.or(existing.discount_percentage))
    .bind(payload.stock_quantity.or(existing.stock_quantity))
    .bind(payload.warehouse_location.as_deref().or(existing.warehouse_location.as_deref()))
    .bind(payload.sku.as_deref().or(existing.sku.as_deref()))
    .bind(payload.processor.as_deref().or(existing.processor.as_deref()))
    .bind(payload.memory.as_deref().or(existing.memory.as_deref()))
    .bind(payload.storage_capacity.as_deref().or(existing.storage_capacity.as_deref()))
    .bind(payload.display_size.as_deref().or(existing.display_size.as_deref()))
    .bind(payload.is_available.unwrap_or(existing.is_available))
    .bind(payload.release_date.or(existing.release_date))
    .bind(payload.average_rating.or(existing.average_rating))
    .bind(payload.rating_count.or(existing.rating_count))
    .bind(payload.warranty_months.or(existing.warranty_months))
    .bind(payload.weight_kg.or(existing.weight_kg))
    .bind(existing.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(product)
}

pub async fn delete_product(pool: &PgPool, product_id: &str) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Product {} not found", product_id)));
    }
    Ok(())
}

pub async fn count_products(pool: &PgPool) -> AppResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
