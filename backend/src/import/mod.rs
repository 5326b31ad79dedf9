//! Bulk import of product records in the upstream electronics-feed shape
//! (`productId`, `productName`, `brandName`, ...). Malformed records are dropped,
//! the rest are mapped onto catalog rows.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db;
use crate::error::AppResult;
use crate::models::{parse_iso_date, CreateBrand, CreateProduct, Product};

pub const REQUIRED_SOURCE_FIELDS: &[&str] = &[
    "productId",
    "productName",
    "brandName",
    "category",
    "description",
    "price",
    "currency",
    "processor",
    "memory",
    "releaseDate",
    "averageRating",
    "ratingCount",
];

/// A source record that passed the malformed-item checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRecord {
    pub product_id: String,
    pub product_name: String,
    pub brand_name: String,
    pub category_name: Option<String>,
    pub description_text: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub processor: Option<String>,
    pub memory: Option<String>,
    pub release_date: Option<String>,
    pub average_rating: Option<Decimal>,
    pub rating_count: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_malformed: usize,
    pub skipped_existing: usize,
    pub data: Vec<Product>,
}

fn number_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}

/// `Ok(None)` for null, `Err(())` for a value of the wrong type.
fn optional_text(item: &Map<String, Value>, key: &str) -> Result<Option<String>, ()> {
    match item.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(()),
    }
}

fn required_text(item: &Map<String, Value>, key: &str) -> Option<String> {
    match item.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Parses one feed item. Returns `None` when the item is malformed:
/// - not an object, or any of [`REQUIRED_SOURCE_FIELDS`] is missing
/// - `releaseDate` present but not `YYYY-MM-DD`
/// - `price` present but not a number
/// - `averageRating` present but not a number in `[0, 5]`
/// - `ratingCount` present but not a non-negative integer
/// - identifying text (`productId`, `productName`, `brandName`) empty or not a string
/// - any other text field holding a non-string value
pub fn parse_source_item(item: &Value) -> Option<SourceRecord> {
    let item = item.as_object()?;

    if REQUIRED_SOURCE_FIELDS.iter().any(|k| !item.contains_key(*k)) {
        return None;
    }

    let release_date = match &item["releaseDate"] {
        Value::Null => None,
        Value::String(s) if parse_iso_date(s).is_some() => Some(s.clone()),
        _ => return None,
    };

    let price = match &item["price"] {
        Value::Null => None,
        v => Some(number_to_decimal(v)?),
    };

    let average_rating = match &item["averageRating"] {
        Value::Null => None,
        v => {
            let rating = number_to_decimal(v)?;
            if rating < Decimal::ZERO || rating > Decimal::from(5) {
                return None;
            }
            Some(rating)
        }
    };

    let rating_count = match &item["ratingCount"] {
        Value::Null => None,
        v => Some(i32::try_from(v.as_u64()?).ok()?),
    };

    Some(SourceRecord {
        product_id: required_text(item, "productId")?,
        product_name: required_text(item, "productName")?,
        brand_name: required_text(item, "brandName")?,
        category_name: optional_text(item, "category").ok()?,
        description_text: optional_text(item, "description").ok()?,
        price,
        currency: optional_text(item, "currency").ok()?,
        processor: optional_text(item, "processor").ok()?,
        memory: optional_text(item, "memory").ok()?,
        release_date,
        average_rating,
        rating_count,
    })
}

/// Keeps the well-formed records; the second value is how many items were dropped.
pub fn clean_source_items(items: &[Value]) -> (Vec<SourceRecord>, usize) {
    let records: Vec<SourceRecord> = items.iter().filter_map(parse_source_item).collect();
    let malformed = items.len() - records.len();
    (records, malformed)
}

impl SourceRecord {
    fn to_create_product(&self, brand_id: i32) -> CreateProduct {
        CreateProduct {
            product_id: self.product_id.clone(),
            name: self.product_name.clone(),
            brand_id,
            category: self.category_name.clone(),
            description: self.description_text.clone(),
            price: self.price,
            // Feeds are loose about case; the catalog stores ISO codes uppercase.
            currency: self.currency.as_ref().map(|c| c.to_ascii_uppercase()),
            processor: self.processor.clone(),
            memory: self.memory.clone(),
            release_date: self.release_date.as_deref().and_then(parse_iso_date),
            average_rating: self.average_rating,
            rating_count: self.rating_count,
            ..Default::default()
        }
    }

    /// Whether the record fits the catalog's value ranges and column limits,
    /// including the brand row it would create.
    fn passes_value_checks(&self) -> bool {
        let brand = CreateBrand {
            name: self.brand_name.clone(),
            founded_year: None,
            street: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
        };
        brand.validate().is_ok() && self.to_create_product(0).validate().is_ok()
    }
}

/// Writes cleaned feed items in one transaction. Brands are matched by name and created
/// when missing; products whose `productId` already exists are left untouched. Records
/// that fail the catalog's value checks count as malformed.
pub async fn import_items(pool: &PgPool, items: &[Value]) -> AppResult<ImportReport> {
    let (records, mut skipped_malformed) = clean_source_items(items);
    info!(
        received = items.len(),
        well_formed = records.len(),
        "Importing products"
    );

    let mut tx = pool.begin().await?;
    let mut data = Vec::with_capacity(records.len());
    let mut skipped_existing = 0;

    for record in &records {
        // Value checks run before the brand upsert so rejected rows leave no brand behind.
        if !record.passes_value_checks() {
            debug!(product_id = %record.product_id, "Skipping record that fails value checks");
            skipped_malformed += 1;
            continue;
        }

        let brand_id = db::upsert_brand_by_name(&mut *tx, &record.brand_name).await?;
        let payload = record.to_create_product(brand_id);

        match db::insert_product_if_absent(&mut *tx, &payload).await? {
            Some(product) => data.push(product),
            None => skipped_existing += 1,
        }
    }

    tx.commit().await?;

    info!(
        imported = data.len(),
        skipped_malformed,
        skipped_existing,
        "Import complete"
    );

    Ok(ImportReport {
        imported: data.len(),
        skipped_malformed,
        skipped_existing,
        data,
    })
}
