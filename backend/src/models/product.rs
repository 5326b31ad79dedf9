use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validate::{
    currency_code, decimal_fits, decimal_in_range, max_len, non_negative_decimal,
    non_negative_int, parse_iso_date, require_text,
};
use crate::error::{AppError, AppResult};

/// Catalog item as returned by the API: the `products` row plus its brand's name.
/// `id` is the surrogate key; clients address products by `product_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub product_id: String,
    pub name: String,
    pub brand_id: i32,
    pub brand_name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub warehouse_location: Option<String>,
    pub sku: Option<String>,
    pub processor: Option<String>,
    pub memory: Option<String>,
    pub storage_capacity: Option<String>,
    pub display_size: Option<String>,
    pub is_available: bool,
    pub release_date: Option<NaiveDate>,
    pub last_updated: DateTime<Utc>,
    pub average_rating: Option<Decimal>,
    pub rating_count: Option<i32>,
    pub warranty_months: Option<i32>,
    pub weight_kg: Option<Decimal>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub product_id: String,
    pub name: String,
    pub brand_id: i32,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub warehouse_location: Option<String>,
    pub sku: Option<String>,
    pub processor: Option<String>,
    pub memory: Option<String>,
    pub storage_capacity: Option<String>,
    pub display_size: Option<String>,
    /// Defaults to available when omitted.
    pub is_available: Option<bool>,
    pub release_date: Option<NaiveDate>,
    pub average_rating: Option<Decimal>,
    pub rating_count: Option<i32>,
    pub warranty_months: Option<i32>,
    pub weight_kg: Option<Decimal>,
}

impl CreateProduct {
    pub fn validate(&self) -> AppResult<()> {
        require_text("productId", &self.product_id)?;
        require_text("name", &self.name)?;
        max_len("productId", Some(&self.product_id), 64)?;
        check_columns(ColumnValues {
            name: Some(&self.name),
            category: self.category.as_deref(),
            warehouse_location: self.warehouse_location.as_deref(),
            sku: self.sku.as_deref(),
            processor: self.processor.as_deref(),
            memory: self.memory.as_deref(),
            storage_capacity: self.storage_capacity.as_deref(),
            display_size: self.display_size.as_deref(),
            price: self.price,
            discount_percentage: self.discount_percentage,
            stock_quantity: self.stock_quantity,
            average_rating: self.average_rating,
            rating_count: self.rating_count,
            warranty_months: self.warranty_months,
            weight_kg: self.weight_kg,
        })?;
        currency_code(self.currency.as_deref())
    }
}

/// Partial update: omitted fields keep their stored value. `productId` is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub brand_id: Option<i32>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub warehouse_location: Option<String>,
    pub sku: Option<String>,
    pub processor: Option<String>,
    pub memory: Option<String>,
    pub storage_capacity: Option<String>,
    pub display_size: Option<String>,
    pub is_available: Option<bool>,
    pub release_date: Option<NaiveDate>,
    pub average_rating: Option<Decimal>,
    pub rating_count: Option<i32>,
    pub warranty_months: Option<i32>,
    pub weight_kg: Option<Decimal>,
}

impl UpdateProduct {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        check_columns(ColumnValues {
            name: self.name.as_deref(),
            category: self.category.as_deref(),
            warehouse_location: self.warehouse_location.as_deref(),
            sku: self.sku.as_deref(),
            processor: self.processor.as_deref(),
            memory: self.memory.as_deref(),
            storage_capacity: self.storage_capacity.as_deref(),
            display_size: self.display_size.as_deref(),
            price: self.price,
            discount_percentage: self.discount_percentage,
            stock_quantity: self.stock_quantity,
            average_rating: self.average_rating,
            rating_count: self.rating_count,
            warranty_months: self.warranty_months,
            weight_kg: self.weight_kg,
        })?;
        currency_code(self.currency.as_deref())
    }
}

/// Borrowed view of the writable columns shared by create and update payloads.
struct ColumnValues<'a> {
    name: Option<&'a str>,
    category: Option<&'a str>,
    warehouse_location: Option<&'a str>,
    sku: Option<&'a str>,
    processor: Option<&'a str>,
    memory: Option<&'a str>,
    storage_capacity: Option<&'a str>,
    display_size: Option<&'a str>,
    price: Option<Decimal>,
    discount_percentage: Option<Decimal>,
    stock_quantity: Option<i32>,
    average_rating: Option<Decimal>,
    rating_count: Option<i32>,
    warranty_months: Option<i32>,
    weight_kg: Option<Decimal>,
}

/// Value ranges plus the column limits of the `products` table, so nothing is
/// silently rounded or rejected by the database with a server error.
fn check_columns(fields: ColumnValues<'_>) -> AppResult<()> {
    max_len("name", fields.name, 255)?;
    max_len("category", fields.category, 100)?;
    max_len("warehouseLocation", fields.warehouse_location, 100)?;
    max_len("sku", fields.sku, 64)?;
    max_len("processor", fields.processor, 255)?;
    max_len("memory", fields.memory, 100)?;
    max_len("storageCapacity", fields.storage_capacity, 100)?;
    max_len("displaySize", fields.display_size, 100)?;

    non_negative_decimal("price", fields.price)?;
    decimal_fits("price", fields.price, 10, 2)?;
    decimal_in_range(
        "discountPercentage",
        fields.discount_percentage,
        Decimal::ZERO,
        Decimal::ONE_HUNDRED,
    )?;
    decimal_fits("discountPercentage", fields.discount_percentage, 5, 2)?;
    non_negative_int("stockQuantity", fields.stock_quantity)?;
    decimal_in_range(
        "averageRating",
        fields.average_rating,
        Decimal::ZERO,
        Decimal::from(5),
    )?;
    decimal_fits("averageRating", fields.average_rating, 3, 2)?;
    non_negative_int("ratingCount", fields.rating_count)?;
    non_negative_int("warrantyMonths", fields.warranty_months)?;
    non_negative_decimal("weightKg", fields.weight_kg)?;
    decimal_fits("weightKg", fields.weight_kg, 8, 3)
}

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub brand_id: Option<i32>,
    /// Exact brand name.
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub available: Option<bool>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub release_date_start: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub release_date_end: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductFilters {
    /// Parses the release-date bounds; any malformed bound rejects the whole request.
    pub fn release_date_range(&self) -> AppResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        let parse = |raw: &Option<String>| -> AppResult<Option<NaiveDate>> {
            match raw.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => parse_iso_date(s).map(Some).ok_or_else(|| {
                    AppError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string())
                }),
            }
        };
        Ok((
            parse(&self.release_date_start)?,
            parse(&self.release_date_end)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn laptop() -> CreateProduct {
        CreateProduct {
            product_id: "SKU-LPTP-001".to_string(),
            name: "Innovatech ProBook 15".to_string(),
            brand_id: 1,
            price: Some(Decimal::from_str("1299.99").unwrap()),
            currency: Some("USD".to_string()),
            average_rating: Some(Decimal::from_str("4.50").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(laptop().validate().is_ok());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut p = laptop();
        p.price = Some(Decimal::from_str("-1.00").unwrap());
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut p = laptop();
        p.stock_quantity = Some(-3);
        assert!(p.validate().is_err());
    }

    #[test]
    fn rating_above_five_is_rejected() {
        let mut p = laptop();
        p.average_rating = Some(Decimal::from_str("5.5").unwrap());
        assert!(p.validate().is_err());
    }

    #[test]
    fn discount_above_hundred_is_rejected() {
        let mut p = laptop();
        p.discount_percentage = Some(Decimal::from(101));
        assert!(p.validate().is_err());
    }

    #[test]
    fn blank_product_id_is_rejected() {
        let mut p = laptop();
        p.product_id = " ".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn price_with_sub_cent_digits_is_rejected() {
        let mut p = laptop();
        p.price = Some(Decimal::from_str("1299.999").unwrap());
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));

        p.price = Some(Decimal::from_str("1299.990").unwrap());
        assert!(p.validate().is_ok(), "trailing zeros do not change the value");
    }

    #[test]
    fn price_beyond_column_precision_is_rejected() {
        let mut p = laptop();
        p.price = Some(Decimal::from_str("123456789.00").unwrap());
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rating_and_weight_keep_their_scale() {
        let mut p = laptop();
        p.average_rating = Some(Decimal::from_str("4.555").unwrap());
        assert!(p.validate().is_err());

        let mut p = laptop();
        p.weight_kg = Some(Decimal::from_str("1.8005").unwrap());
        assert!(p.validate().is_err());
    }

    #[test]
    fn over_long_text_is_rejected() {
        let mut p = laptop();
        p.product_id = "X".repeat(65);
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));

        let mut p = laptop();
        p.sku = Some("S".repeat(65));
        assert!(p.validate().is_err());

        let mut p = laptop();
        p.name = "N".repeat(256);
        assert!(p.validate().is_err());
    }

    #[test]
    fn lowercase_currency_is_rejected() {
        let mut p = laptop();
        p.currency = Some("usd".to_string());
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn update_checks_column_limits() {
        let update = UpdateProduct {
            category: Some("c".repeat(101)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = UpdateProduct {
            price: Some(Decimal::from_str("0.001").unwrap()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateProduct::default().validate().is_ok());
    }

    #[test]
    fn update_checks_the_fields_it_sets() {
        let update = UpdateProduct {
            stock_quantity: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn price_keeps_exact_precision_through_json() {
        let payload: CreateProduct = serde_json::from_value(serde_json::json!({
            "productId": "SKU-LPTP-001",
            "name": "Innovatech ProBook 15",
            "brandId": 1,
            "price": 1299.99,
            "releaseDate": "2023-03-15",
        }))
        .unwrap();
        assert_eq!(payload.price, Some(Decimal::from_str("1299.99").unwrap()));
        assert_eq!(payload.release_date, NaiveDate::from_ymd_opt(2023, 3, 15));
    }

    #[test]
    fn product_serializes_camel_case_with_numeric_price() {
        let product = Product {
            id: 1,
            product_id: "SKU-LPTP-001".to_string(),
            name: "Innovatech ProBook 15".to_string(),
            brand_id: 1,
            brand_name: "Innovatech".to_string(),
            category: None,
            description: None,
            price: Some(Decimal::from_str("1299.99").unwrap()),
            currency: None,
            discount_percentage: None,
            stock_quantity: Some(50),
            warehouse_location: None,
            sku: None,
            processor: None,
            memory: None,
            storage_capacity: None,
            display_size: None,
            is_available: true,
            release_date: None,
            last_updated: Utc::now(),
            average_rating: None,
            rating_count: None,
            warranty_months: None,
            weight_kg: None,
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["productId"], "SKU-LPTP-001");
        assert_eq!(json["brandName"], "Innovatech");
        assert_eq!(json["stockQuantity"], 50);
        assert_eq!(json["price"].as_f64(), Some(1299.99));
    }

    #[test]
    fn release_date_range_parses_both_bounds() {
        let filters = ProductFilters {
            release_date_start: Some("2022-01-01".to_string()),
            release_date_end: Some("2023-12-31".to_string()),
            ..Default::default()
        };
        let (start, end) = filters.release_date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2022, 1, 1));
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn release_date_range_rejects_bad_format() {
        let filters = ProductFilters {
            release_date_start: Some("01/01/2022".to_string()),
            ..Default::default()
        };
        match filters.release_date_range() {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid date format. Use YYYY-MM-DD."),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn release_date_range_treats_missing_as_open() {
        let (start, end) = ProductFilters::default().release_date_range().unwrap();
        assert!(start.is_none() && end.is_none());
    }
}
