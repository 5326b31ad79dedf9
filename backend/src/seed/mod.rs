use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{Brand, CreateBrand, CreateProduct, Product};

#[derive(Debug)]
pub struct SeedReport {
    pub brands: Vec<Brand>,
    pub products: Vec<Product>,
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

fn decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value).ok()
}

pub fn seed_brands() -> Vec<CreateBrand> {
    vec![
        CreateBrand {
            name: "Innovatech".to_string(),
            founded_year: Some(1998),
            street: text("123 Tech Park Avenue"),
            city: text("San Francisco"),
            state: text("CA"),
            postal_code: text("94107"),
            country: text("USA"),
        },
        CreateBrand {
            name: "SoundWave".to_string(),
            founded_year: Some(2005),
            street: text("45 Harmony Road"),
            city: text("Austin"),
            state: text("TX"),
            postal_code: text("73301"),
            country: text("USA"),
        },
    ]
}

/// Seed products paired with the name of the brand they belong to. `brand_id` is left
/// at zero and filled in from the id the database assigned to that brand.
pub fn seed_products() -> Vec<(&'static str, CreateProduct)> {
    vec![
        (
            "Innovatech",
            CreateProduct {
                product_id: "SKU-LPTP-001".to_string(),
                name: "Innovatech ProBook 15".to_string(),
                brand_id: 0,
                category: text("Laptops"),
                description: text("15.6-inch business laptop with all-day battery life."),
                price: decimal("1299.99"),
                currency: text("USD"),
                discount_percentage: decimal("10.00"),
                stock_quantity: Some(50),
                warehouse_location: text("WH-SF-01"),
                sku: text("INV-PB15-2023"),
                processor: text("Intel Core i7-1355U"),
                memory: text("16GB"),
                storage_capacity: text("512GB SSD"),
                display_size: text("15.6 inch"),
                is_available: Some(true),
                release_date: NaiveDate::from_ymd_opt(2023, 3, 15),
                average_rating: decimal("4.50"),
                rating_count: Some(128),
                warranty_months: Some(24),
                weight_kg: decimal("1.800"),
            },
        ),
        (
            "SoundWave",
            CreateProduct {
                product_id: "SKU-HDPH-002".to_string(),
                name: "SoundWave Studio Max".to_string(),
                brand_id: 0,
                category: text("Audio"),
                description: text("Over-ear wireless headphones with active noise cancellation."),
                price: decimal("249.50"),
                currency: text("USD"),
                discount_percentage: decimal("5.00"),
                stock_quantity: Some(200),
                warehouse_location: text("WH-AUS-02"),
                sku: text("SWV-SMX-2022"),
                processor: None,
                memory: None,
                storage_capacity: None,
                display_size: None,
                is_available: Some(true),
                release_date: NaiveDate::from_ymd_opt(2022, 11, 1),
                average_rating: decimal("4.20"),
                rating_count: Some(342),
                warranty_months: Some(12),
                weight_kg: decimal("0.350"),
            },
        ),
    ]
}

/// Seed the catalog inside one transaction. Brand ids are captured from the inserts and
/// looked up by name for each product. Any failure (e.g. the catalog is already seeded)
/// rolls the whole seed back.
pub async fn seed_catalog(pool: &PgPool) -> AppResult<SeedReport> {
    info!("Seeding catalog...");

    let mut tx = pool.begin().await?;

    let mut brands = Vec::new();
    let mut brand_ids: HashMap<String, i32> = HashMap::new();
    for payload in seed_brands() {
        let brand = db::insert_brand(&mut *tx, &payload).await?;
        info!(id = brand.id, name = %brand.name, "  Seeded brand");
        brand_ids.insert(brand.name.clone(), brand.id);
        brands.push(brand);
    }

    let mut products = Vec::new();
    for (brand_name, mut payload) in seed_products() {
        payload.brand_id = *brand_ids.get(brand_name).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "seed product {} references unknown brand {}",
                payload.product_id,
                brand_name
            ))
        })?;
        let product = db::insert_product(&mut *tx, &payload).await?;
        info!(product_id = %product.product_id, brand = %product.brand_name, "  Seeded product");
        products.push(product);
    }

    tx.commit().await?;

    info!(
        brands = brands.len(),
        products = products.len(),
        "Seeding complete"
    );
    Ok(SeedReport { brands, products })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_literals_are_valid_payloads() {
        for brand in seed_brands() {
            assert!(brand.validate().is_ok(), "brand {} must validate", brand.name);
        }
        for (_, product) in seed_products() {
            assert!(product.validate().is_ok(), "product {} must validate", product.product_id);
        }
    }

    #[test]
    fn seed_literals_respect_uniqueness() {
        let names: HashSet<String> = seed_brands().into_iter().map(|b| b.name).collect();
        assert_eq!(names.len(), 2);

        let ids: HashSet<String> = seed_products()
            .into_iter()
            .map(|(_, p)| p.product_id)
            .collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn every_seed_product_names_a_seed_brand() {
        let names: HashSet<String> = seed_brands().into_iter().map(|b| b.name).collect();
        for (brand_name, product) in seed_products() {
            assert!(
                names.contains(brand_name),
                "{} references missing brand {}",
                product.product_id,
                brand_name
            );
        }
    }

    #[test]
    fn laptop_is_owned_by_innovatech() {
        let products = seed_products();
        let (brand, laptop) = products
            .iter()
            .find(|(_, p)| p.product_id == "SKU-LPTP-001")
            .unwrap();
        assert_eq!(*brand, "Innovatech");
        assert_eq!(laptop.price, Some(Decimal::from_str("1299.99").unwrap()));
        assert_eq!(laptop.price.unwrap().to_string(), "1299.99");
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn seeding_a_fresh_store_resolves_brands_by_name(pool: PgPool) {
        let report = seed_catalog(&pool).await.unwrap();
        assert_eq!(report.brands.len(), 2);
        assert_eq!(report.products.len(), 2);
        assert_eq!(db::count_brands(&pool).await.unwrap(), 2);
        assert_eq!(db::count_products(&pool).await.unwrap(), 2);

        let laptop = db::fetch_product_by_product_id(&pool, "SKU-LPTP-001").await.unwrap();
        assert_eq!(laptop.brand_name, "Innovatech");
        assert_eq!(laptop.price.unwrap().to_string(), "1299.99");

        let headphones = db::fetch_product_by_product_id(&pool, "SKU-HDPH-002").await.unwrap();
        assert_eq!(headphones.brand_name, "SoundWave");
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn seed_does_not_assume_ids_start_at_one(pool: PgPool) {
        // Burn a few sequence values so the seed brands get ids other than 1 and 2.
        for name in ["Placeholder A", "Placeholder B", "Placeholder C"] {
            let id = db::upsert_brand_by_name(&pool, name).await.unwrap();
            db::delete_brand(&pool, id).await.unwrap();
        }

        seed_catalog(&pool).await.unwrap();

        let laptop = db::fetch_product_by_product_id(&pool, "SKU-LPTP-001").await.unwrap();
        assert_eq!(laptop.brand_name, "Innovatech");
        assert!(laptop.brand_id > 3);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn reseeding_is_a_conflict_and_changes_nothing(pool: PgPool) {
        seed_catalog(&pool).await.unwrap();

        let err = seed_catalog(&pool).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
        assert_eq!(db::count_brands(&pool).await.unwrap(), 2);
        assert_eq!(db::count_products(&pool).await.unwrap(), 2);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn partial_conflict_rolls_back_the_whole_seed(pool: PgPool) {
        // Only the second brand pre-exists: the first insert succeeds inside the
        // transaction, the second fails, and nothing may remain.
        db::upsert_brand_by_name(&pool, "SoundWave").await.unwrap();

        let err = seed_catalog(&pool).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
        assert_eq!(db::count_brands(&pool).await.unwrap(), 1);
        assert_eq!(db::count_products(&pool).await.unwrap(), 0);
    }
}
