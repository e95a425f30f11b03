//! Side-by-side comparison of phone records.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Plain,
    Year,
    Gigabytes,
    Inches,
    MilliampHours,
    Dollars,
}

struct Field {
    label: &'static str,
    key: &'static str,
    category: &'static str,
    format: Format,
    highlight: bool,
}

const fn field(
    label: &'static str,
    key: &'static str,
    category: &'static str,
    format: Format,
    highlight: bool,
) -> Field {
    Field {
        label,
        key,
        category,
        format,
        highlight,
    }
}

const FIELDS: &[Field] = &[
    field("Brand", "brand_name", "Basic", Format::Plain, true),
    field("Model", "model", "Basic", Format::Plain, false),
    field("Status", "status", "Basic", Format::Plain, true),
    field("Release Date", "release_date", "Basic", Format::Year, true),
    field("Chipset", "chipset_name", "Performance", Format::Plain, true),
    field("RAM", "ram_gb", "Performance", Format::Gigabytes, true),
    field("Storage", "internal_storage_gb", "Performance", Format::Gigabytes, true),
    field("Screen Size", "screen_size", "Display", Format::Inches, true),
    field("Display Type", "display_type_name", "Display", Format::Plain, true),
    field("Battery", "battery_capacity", "Battery", Format::MilliampHours, true),
    field("Price (Unofficial)", "price_unofficial", "Pricing", Format::Dollars, true),
    field("Price (Official)", "price_official", "Pricing", Format::Dollars, true),
];

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub category: &'static str,
    pub label: &'static str,
    pub values: Vec<String>,
    /// Set when the raw values differ across phones and the field is one
    /// worth drawing attention to.
    pub differs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    /// `"Brand Model"` per compared phone, in input order.
    pub headers: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Builds the table from phone records (listing rows or detail records;
    /// both are JSON objects keyed by column name). Missing keys render as N/A.
    pub fn build(phones: &[Map<String, JsonValue>]) -> Self {
        let headers = phones
            .iter()
            .map(|p| {
                let brand = p.get("brand_name").and_then(JsonValue::as_str).unwrap_or("");
                let model = p.get("model").and_then(JsonValue::as_str).unwrap_or("");
                format!("{} {}", brand, model).trim().to_string()
            })
            .collect();

        let rows = FIELDS
            .iter()
            .map(|field| {
                let raw: Vec<&JsonValue> = phones
                    .iter()
                    .map(|p| p.get(field.key).unwrap_or(&JsonValue::Null))
                    .collect();
                let differs = field.highlight
                    && raw.len() > 1
                    && raw.iter().any(|v| *v != raw[0]);
                ComparisonRow {
                    category: field.category,
                    label: field.label,
                    values: raw.iter().map(|v| format_value(field.format, v)).collect(),
                    differs,
                }
            })
            .collect();

        ComparisonTable { headers, rows }
    }
}

fn format_value(format: Format, value: &JsonValue) -> String {
    let is_absent = match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    };
    if is_absent {
        return NOT_AVAILABLE.to_string();
    }

    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    match format {
        Format::Plain => text,
        Format::Year => text.get(..4).map(str::to_string).unwrap_or(text),
        Format::Gigabytes => format!("{}GB", text),
        Format::Inches => format!("{}\"", text),
        Format::MilliampHours => format!("{}mAh", text),
        Format::Dollars => match value.as_f64() {
            Some(amount) => format!("${}", group_thousands(amount)),
            None => format!("${}", text),
        },
    }
}

fn group_thousands(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let whole = (cents / 100).abs();
    let frac = (cents % 100).abs();
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if cents < 0 { "-" } else { "" };
    if frac == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, frac)
    }
}
