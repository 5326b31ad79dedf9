//! Boundary checks shared by the create/update payloads. The stored schema does not
//! enforce value ranges, so requests are rejected here before reaching the database.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

pub(crate) fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn non_negative_decimal(field: &str, value: Option<Decimal>) -> AppResult<()> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => {
            Err(AppError::BadRequest(format!("{field} must be >= 0")))
        }
        _ => Ok(()),
    }
}

pub(crate) fn non_negative_int(field: &str, value: Option<i32>) -> AppResult<()> {
    match value {
        Some(v) if v < 0 => Err(AppError::BadRequest(format!("{field} must be >= 0"))),
        _ => Ok(()),
    }
}

pub(crate) fn decimal_in_range(
    field: &str,
    value: Option<Decimal>,
    min: Decimal,
    max: Decimal,
) -> AppResult<()> {
    match value {
        Some(v) if v < min || v > max => Err(AppError::BadRequest(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

/// Rejects values a `NUMERIC(precision, scale)` column would round or overflow.
/// Trailing zeros beyond the scale are fine (`1.800` fits `NUMERIC(8,3)` and `(10,2)`).
pub(crate) fn decimal_fits(
    field: &str,
    value: Option<Decimal>,
    precision: u32,
    scale: u32,
) -> AppResult<()> {
    let Some(v) = value else {
        return Ok(());
    };
    if v.normalize().scale() > scale {
        return Err(AppError::BadRequest(format!(
            "{field} allows at most {scale} decimal places"
        )));
    }
    let limit = Decimal::from(10i64.pow(precision - scale));
    if v.abs() >= limit {
        return Err(AppError::BadRequest(format!(
            "{field} must be less than {limit}"
        )));
    }
    Ok(())
}

/// Length limit in characters, matching the `VARCHAR(n)` column the value lands in.
pub(crate) fn max_len(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(s) if s.chars().count() > max => Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// ISO 4217 style: exactly three uppercase ASCII letters.
pub(crate) fn currency_code(value: Option<&str>) -> AppResult<()> {
    match value {
        Some(code) if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) => Err(
            AppError::BadRequest("currency must be a three-letter uppercase code".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Parses a strict `YYYY-MM-DD` date. Unpadded forms such as `2023-3-5` are rejected.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn iso_date_accepts_padded_dates_only() {
        assert_eq!(
            parse_iso_date("2023-03-15"),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
        assert_eq!(parse_iso_date("2023-3-15"), None);
        assert_eq!(parse_iso_date("15/03/2023"), None);
        assert_eq!(parse_iso_date("2023-02-30"), None, "calendar-invalid date");
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn negative_zero_is_not_negative() {
        let neg_zero = Decimal::from_str("-0.00").unwrap();
        assert!(non_negative_decimal("price", Some(neg_zero)).is_ok());
        assert!(non_negative_decimal("price", Some(Decimal::from_str("-0.01").unwrap())).is_err());
        assert!(non_negative_decimal("price", None).is_ok());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let five = Decimal::from(5);
        assert!(decimal_in_range("averageRating", Some(five), Decimal::ZERO, five).is_ok());
        assert!(decimal_in_range("averageRating", Some(Decimal::ZERO), Decimal::ZERO, five).is_ok());
        assert!(
            decimal_in_range("averageRating", Some(Decimal::from_str("5.01").unwrap()), Decimal::ZERO, five)
                .is_err()
        );
    }

    #[test]
    fn currency_must_be_three_letters() {
        assert!(currency_code(Some("USD")).is_ok());
        assert!(currency_code(None).is_ok());
        assert!(currency_code(Some("US")).is_err());
        assert!(currency_code(Some("US1")).is_err());
        assert!(currency_code(Some("EURO")).is_err());
        assert!(currency_code(Some("usd")).is_err());
        assert!(currency_code(Some("Usd")).is_err());
    }

    #[test]
    fn decimals_must_fit_their_column() {
        let d = |s: &str| Some(Decimal::from_str(s).unwrap());
        // NUMERIC(10,2)
        assert!(decimal_fits("price", d("1299.99"), 10, 2).is_ok());
        assert!(decimal_fits("price", d("1299.990"), 10, 2).is_ok());
        assert!(decimal_fits("price", d("12.345"), 10, 2).is_err(), "would round");
        assert!(decimal_fits("price", d("99999999.99"), 10, 2).is_ok());
        assert!(decimal_fits("price", d("100000000"), 10, 2).is_err(), "would overflow");
        assert!(decimal_fits("price", None, 10, 2).is_ok());
        // NUMERIC(8,3)
        assert!(decimal_fits("weightKg", d("1.800"), 8, 3).is_ok());
        assert!(decimal_fits("weightKg", d("0.0005"), 8, 3).is_err());
        assert!(decimal_fits("weightKg", d("100000"), 8, 3).is_err());
    }

    #[test]
    fn text_length_counts_characters() {
        assert!(max_len("currency", Some("EUR"), 3).is_ok());
        assert!(max_len("sku", Some(&"x".repeat(64)), 64).is_ok());
        assert!(max_len("sku", Some(&"x".repeat(65)), 64).is_err());
        // Multi-byte characters count once each, as in VARCHAR.
        assert!(max_len("city", Some("Zürich"), 6).is_ok());
        assert!(max_len("city", None, 1).is_ok());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("name", "   ").is_err());
        assert!(require_text("name", "Innovatech").is_ok());
    }
}
