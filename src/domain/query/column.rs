//! Column identifiers the builder is allowed to emit.
//!
//! Identifiers are never taken from user input: requests name a column and
//! the allow-list below decides which qualified identifier (if any) it maps to.

use serde::{Deserialize, Serialize};

/// Filterable columns, qualified by the aliases used in the listing joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    BrandName,
    ChipsetName,
    DisplayTypeName,
    InternalStorageGb,
    RamGb,
    BatteryCapacity,
    PriceUnofficial,
    PriceOfficial,
    ScreenSize,
}

impl Column {
    pub fn qualified(&self) -> &'static str {
        match self {
            Column::BrandName => "b.brand_name",
            Column::ChipsetName => "c.chipset_name",
            Column::DisplayTypeName => "dt.display_type_name",
            Column::InternalStorageGb => "ps.internal_storage_gb",
            Column::RamGb => "ps.ram_gb",
            Column::BatteryCapacity => "ps.battery_capacity",
            Column::PriceUnofficial => "pr.price_unofficial",
            Column::PriceOfficial => "pr.price_official",
            Column::ScreenSize => "ds.screen_size",
        }
    }

    /// The column name without its table alias.
    pub fn name(&self) -> &'static str {
        let qualified = self.qualified();
        qualified
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or(qualified)
    }
}

/// Sortable columns. Every entry is part of the listing's select list, which
/// Postgres requires for `SELECT DISTINCT ... ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    PhoneId,
    BrandName,
    Model,
    ReleaseDate,
    RamGb,
    InternalStorageGb,
    BatteryCapacity,
    ScreenSize,
    PriceUnofficial,
    PriceOfficial,
}

impl SortColumn {
    pub const ALL: [SortColumn; 10] = [
        SortColumn::PhoneId,
        SortColumn::BrandName,
        SortColumn::Model,
        SortColumn::ReleaseDate,
        SortColumn::RamGb,
        SortColumn::InternalStorageGb,
        SortColumn::BatteryCapacity,
        SortColumn::ScreenSize,
        SortColumn::PriceUnofficial,
        SortColumn::PriceOfficial,
    ];

    pub fn qualified(&self) -> &'static str {
        match self {
            SortColumn::PhoneId => "p.phone_id",
            SortColumn::BrandName => "b.brand_name",
            SortColumn::Model => "p.model",
            SortColumn::ReleaseDate => "p.release_date",
            SortColumn::RamGb => "ps.ram_gb",
            SortColumn::InternalStorageGb => "ps.internal_storage_gb",
            SortColumn::BatteryCapacity => "ps.battery_capacity",
            SortColumn::ScreenSize => "ds.screen_size",
            SortColumn::PriceUnofficial => "pr.price_unofficial",
            SortColumn::PriceOfficial => "pr.price_official",
        }
    }

    /// Looks a requested name up in the allow-list. Both the qualified form
    /// (`ps.ram_gb`) and the bare column name (`ram_gb`) are accepted.
    pub fn lookup(requested: &str) -> Option<SortColumn> {
        let requested = requested.trim().to_lowercase();
        SortColumn::ALL.into_iter().find(|col| {
            let qualified = col.qualified();
            let bare = qualified.split_once('.').map(|(_, c)| c).unwrap_or(qualified);
            requested == qualified || requested == bare
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Strict parse used for request validation.
    pub fn parse(raw: &str) -> Option<SortOrder> {
        match raw.trim().to_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A sort request as supplied by the caller, not yet checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(sort_by: Option<String>, order: SortOrder) -> Self {
        Self { sort_by, order }
    }

    /// Resolves against the allow-list. Any column outside it falls back to
    /// the primary key, ascending.
    pub fn resolve(&self) -> (SortColumn, SortOrder) {
        match self.sort_by.as_deref().and_then(SortColumn::lookup) {
            Some(col) => (col, self.order),
            None => (SortColumn::PhoneId, SortOrder::Asc),
        }
    }
}
