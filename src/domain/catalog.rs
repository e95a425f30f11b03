//! Catalog entities as the serving layer reads them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum PhoneStatus {
    #[default]
    Available,
    Upcoming,
    Rumored,
    Discontinued,
}

#[derive(Error, Debug)]
#[error("unknown phone status {0:?}")]
pub struct UnknownStatus(pub String);

impl PhoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneStatus::Available => "Available",
            PhoneStatus::Upcoming => "Upcoming",
            PhoneStatus::Rumored => "Rumored",
            PhoneStatus::Discontinued => "Discontinued",
        }
    }

    /// Maps free-form availability text from source listings onto a status.
    /// Unrecognized text counts as available.
    pub fn from_label(label: &str) -> PhoneStatus {
        let lower = label.to_lowercase();
        if lower.contains("upcoming") || lower.contains("exp.") {
            PhoneStatus::Upcoming
        } else if lower.contains("rumored") {
            PhoneStatus::Rumored
        } else if lower.contains("discontinued") {
            PhoneStatus::Discontinued
        } else {
            PhoneStatus::Available
        }
    }
}

impl fmt::Display for PhoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhoneStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(PhoneStatus::Available),
            "Upcoming" => Ok(PhoneStatus::Upcoming),
            "Rumored" => Ok(PhoneStatus::Rumored),
            "Discontinued" => Ok(PhoneStatus::Discontinued),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for PhoneStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One row of a listing or search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PhoneSummary {
    pub phone_id: i32,
    pub brand_name: String,
    pub model: String,
    pub image_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PhoneStatus,
    #[schema(value_type = Option<String>)]
    pub release_date: Option<NaiveDate>,
    pub ram_gb: Option<i32>,
    pub internal_storage_gb: Option<i32>,
    pub battery_capacity: Option<i32>,
    pub screen_size: Option<f64>,
    pub display_type_name: Option<String>,
    pub chipset_name: Option<String>,
    pub price_unofficial: Option<f64>,
    pub price_official: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PricingVariant {
    pub pricing_id: i32,
    pub price_official: Option<f64>,
    pub price_unofficial: Option<f64>,
    pub price_old: Option<f64>,
    pub price_savings: Option<f64>,
    #[schema(value_type = Option<String>)]
    pub price_updated: Option<NaiveDate>,
    pub variant_description: Option<String>,
}

impl PricingVariant {
    /// A variant with neither price carries nothing worth showing.
    pub fn has_price(&self) -> bool {
        self.price_official.is_some() || self.price_unofficial.is_some()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ColorRow {
    pub color_name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CountRow {
    pub total: i64,
}

/// A row carrying one JSON document (see the detail query).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JsonRecord {
    pub record: JsonValue,
}

/// One group of the filter-options aggregate, still unparsed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptionGroupRow {
    pub kind: String,
    pub options: Option<JsonValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BrandOption {
    pub brand_id: i32,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChipsetOption {
    pub chipset_id: i32,
    pub chipset_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DisplayTypeOption {
    pub display_type_id: i32,
    pub display_type_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Everything a filter form needs to populate its inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub brands: Vec<BrandOption>,
    pub chipsets: Vec<ChipsetOption>,
    pub display_types: Vec<DisplayTypeOption>,
    pub storage_options: Vec<i64>,
    pub price_range: PriceRange,
}
