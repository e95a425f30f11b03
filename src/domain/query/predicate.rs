//! Dialect-free filter predicates.

use crate::domain::filter::FilterCriteria;
use crate::domain::query::column::Column;
use crate::domain::query::SqlParam;

/// A price bound holds for a variant if either listed price satisfies it.
pub const PRICE_COLUMNS: &[Column] = &[Column::PriceUnofficial, Column::PriceOfficial];

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(Column, SqlParam),
    GreaterOrEqual(Column, SqlParam),
    LessOrEqual(Column, SqlParam),
    Between(Column, SqlParam, SqlParam),
    /// Some pricing variant of the phone satisfies every present bound.
    /// At least one of `min` and `max` is set.
    AnyPricedVariant {
        min: Option<SqlParam>,
        max: Option<SqlParam>,
    },
}

impl Predicate {
    /// Values in the order the renderer binds them.
    pub fn params(&self) -> Vec<SqlParam> {
        match self {
            Predicate::Equals(_, v)
            | Predicate::GreaterOrEqual(_, v)
            | Predicate::LessOrEqual(_, v) => vec![v.clone()],
            Predicate::Between(_, lo, hi) => vec![lo.clone(), hi.clone()],
            Predicate::AnyPricedVariant { min, max } => min
                .iter()
                .chain(max.iter())
                .flat_map(|v| vec![v.clone(); PRICE_COLUMNS.len()])
                .collect(),
        }
    }
}

/// Translates criteria into predicates, always in the same field order:
/// brand, chipset, display type, storage, RAM, battery, price min, price max,
/// screen min, screen max.
pub fn predicates_for(criteria: &FilterCriteria) -> Vec<Predicate> {
    let mut out = Vec::new();

    if let Some(brand) = &criteria.brand {
        out.push(Predicate::Equals(Column::BrandName, brand.as_str().into()));
    }
    if let Some(chipset) = &criteria.chipset {
        out.push(Predicate::Equals(Column::ChipsetName, chipset.as_str().into()));
    }
    if let Some(display_type) = &criteria.display_type {
        out.push(Predicate::Equals(
            Column::DisplayTypeName,
            display_type.as_str().into(),
        ));
    }
    if let Some(gb) = criteria.min_internal_storage_gb {
        out.push(Predicate::GreaterOrEqual(Column::InternalStorageGb, gb.into()));
    }
    if let Some(gb) = criteria.min_ram_gb {
        out.push(Predicate::GreaterOrEqual(Column::RamGb, gb.into()));
    }
    if let Some(mah) = criteria.min_battery_capacity {
        out.push(Predicate::GreaterOrEqual(Column::BatteryCapacity, mah.into()));
    }
    if let Some(range) = criteria.price_range {
        if range.min.is_some() || range.max.is_some() {
            out.push(Predicate::AnyPricedVariant {
                min: range.min.map(SqlParam::from),
                max: range.max.map(SqlParam::from),
            });
        }
    }
    if let Some(range) = criteria.screen_size_range {
        match (range.min, range.max) {
            (Some(min), Some(max)) => {
                out.push(Predicate::Between(Column::ScreenSize, min.into(), max.into()))
            }
            (Some(min), None) => {
                out.push(Predicate::GreaterOrEqual(Column::ScreenSize, min.into()))
            }
            (None, Some(max)) => out.push(Predicate::LessOrEqual(Column::ScreenSize, max.into())),
            (None, None) => {}
        }
    }

    out
}
