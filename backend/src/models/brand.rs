use serde::{Deserialize, Serialize};

use super::validate::{max_len, non_negative_int, require_text};
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: i32,
    pub name: String,
    pub founded_year: Option<i32>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrand {
    pub name: String,
    pub founded_year: Option<i32>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl CreateBrand {
    pub fn validate(&self) -> AppResult<()> {
        require_text("name", &self.name)?;
        check_address(AddressValues {
            name: Some(&self.name),
            street: self.street.as_deref(),
            city: self.city.as_deref(),
            state: self.state.as_deref(),
            postal_code: self.postal_code.as_deref(),
            country: self.country.as_deref(),
        })?;
        non_negative_int("foundedYear", self.founded_year)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrand {
    pub name: Option<String>,
    pub founded_year: Option<i32>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl UpdateBrand {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        check_address(AddressValues {
            name: self.name.as_deref(),
            street: self.street.as_deref(),
            city: self.city.as_deref(),
            state: self.state.as_deref(),
            postal_code: self.postal_code.as_deref(),
            country: self.country.as_deref(),
        })?;
        non_negative_int("foundedYear", self.founded_year)
    }
}

struct AddressValues<'a> {
    name: Option<&'a str>,
    street: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    postal_code: Option<&'a str>,
    country: Option<&'a str>,
}

fn check_address(fields: AddressValues<'_>) -> AppResult<()> {
    max_len("name", fields.name, 255)?;
    max_len("street", fields.street, 255)?;
    max_len("city", fields.city, 100)?;
    max_len("state", fields.state, 100)?;
    max_len("postalCode", fields.postal_code, 20)?;
    max_len("country", fields.country, 100)
}

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct BrandFilters {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
