//! Filter criteria: the sparse, optional constraint set a search supplies.
//!
//! Criteria are always stored normalized. Blank strings, non-finite numbers
//! and non-positive bounds are dropped at construction, never rejected, so an
//! all-empty criteria value simply means "the whole catalog".

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Inclusive numeric range; either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct NumericRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericRange {
    /// Keeps only finite, strictly positive bounds. Returns `None` when neither
    /// bound survives.
    pub fn normalized(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        let range = NumericRange {
            min: min.and_then(positive_finite),
            max: max.and_then(positive_finite),
        };
        if range.min.is_none() && range.max.is_none() {
            None
        } else {
            Some(range)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chipset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_internal_storage_gb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ram_gb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_battery_capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<NumericRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_size_range: Option<NumericRange>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = clean_text(Some(brand.into()));
        self
    }

    pub fn with_chipset(mut self, chipset: impl Into<String>) -> Self {
        self.chipset = clean_text(Some(chipset.into()));
        self
    }

    pub fn with_display_type(mut self, display_type: impl Into<String>) -> Self {
        self.display_type = clean_text(Some(display_type.into()));
        self
    }

    pub fn with_min_internal_storage_gb(mut self, gb: i64) -> Self {
        self.min_internal_storage_gb = positive_int(gb);
        self
    }

    pub fn with_min_ram_gb(mut self, gb: i64) -> Self {
        self.min_ram_gb = positive_int(gb);
        self
    }

    pub fn with_min_battery_capacity(mut self, mah: i64) -> Self {
        self.min_battery_capacity = positive_int(mah);
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_range = NumericRange::normalized(min, max);
        self
    }

    pub fn with_screen_size_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.screen_size_range = NumericRange::normalized(min, max);
        self
    }
}

/// Range as it arrives on the wire: bounds may be numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RangeInput {
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub min: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub max: Option<JsonValue>,
}

/// Filters exactly as a client posts them. Numeric fields tolerate strings
/// such as `"128GB"`; everything is normalized by [`SearchFilters::normalize`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub chipset: Option<String>,
    #[serde(default)]
    pub display_type: Option<String>,
    #[serde(default, alias = "minInternalStorageGb")]
    #[schema(value_type = Option<String>)]
    pub internal_storage: Option<JsonValue>,
    #[serde(default, alias = "minRamGb")]
    #[schema(value_type = Option<i64>)]
    pub ram_gb: Option<JsonValue>,
    #[serde(default, alias = "minBatteryCapacity")]
    #[schema(value_type = Option<i64>)]
    pub battery_capacity: Option<JsonValue>,
    #[serde(default)]
    pub price_range: Option<RangeInput>,
    #[serde(default, alias = "screenSizeRange")]
    pub screen_size: Option<RangeInput>,
}

impl SearchFilters {
    pub fn normalize(&self) -> FilterCriteria {
        FilterCriteria {
            brand: clean_text(self.brand.clone()),
            chipset: clean_text(self.chipset.clone()),
            display_type: clean_text(self.display_type.clone()),
            min_internal_storage_gb: self.internal_storage.as_ref().and_then(json_to_int),
            min_ram_gb: self.ram_gb.as_ref().and_then(json_to_int),
            min_battery_capacity: self.battery_capacity.as_ref().and_then(json_to_int),
            price_range: self.price_range.as_ref().and_then(range_from_input),
            screen_size_range: self.screen_size.as_ref().and_then(range_from_input),
        }
    }
}

fn range_from_input(input: &RangeInput) -> Option<NumericRange> {
    NumericRange::normalized(
        input.min.as_ref().and_then(json_to_float),
        input.max.as_ref().and_then(json_to_float),
    )
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn positive_int(n: i64) -> Option<i64> {
    (n > 0).then_some(n)
}

fn positive_finite(x: f64) -> Option<f64> {
    (x.is_finite() && x > 0.0).then_some(x)
}

/// Accepts integers, integral floats and strings with a leading integer
/// (`"128GB"` -> 128). Anything else, or a non-positive value, is absent.
pub fn json_to_int(v: &JsonValue) -> Option<i64> {
    let n = match v {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        JsonValue::String(s) => leading_integer(s),
        _ => None,
    }?;
    positive_int(n)
}

/// Accepts numbers and numeric strings. Non-finite or non-positive is absent.
pub fn json_to_float(v: &JsonValue) -> Option<f64> {
    let x = match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => leading_float(s),
        _ => None,
    }?;
    positive_finite(x)
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (-1, r),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().ok().map(|n| sign * n)
}

fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        let ok = c.is_ascii_digit()
            || (c == '.' && !seen_dot)
            || ((c == '-' || c == '+') && i == 0);
        if !ok {
            break;
        }
        if c == '.' {
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }
    s[..end].parse::<f64>().ok()
}
