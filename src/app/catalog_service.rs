//! The catalog service.
//!
//! One call here is one HTTP request: it builds the statements, runs them
//! through the pool and shapes the result. Every result carries the SQL of
//! its primary statement and how long that statement took.

use crate::domain::catalog::{
    BrandOption, ChipsetOption, ColorRow, CountRow, DisplayTypeOption, FilterOptions, JsonRecord,
    OptionGroupRow, Pagination, PhoneSummary, PriceRange, PricingVariant,
};
use crate::domain::filter::FilterCriteria;
use crate::domain::query::{PageRequest, QueryBuilder, SortOrder, SortSpec};
use crate::error::{AppError, Result};
use crate::storage::database::Database;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use utoipa::ToSchema;

/// A result together with the statement that produced it.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub data: T,
    pub sql_query: String,
    pub execution_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceList {
    pub devices: Vec<PhoneSummary>,
    pub pagination: Pagination,
}

/// The sort that was actually applied, after allow-list resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sorting {
    pub sort_by: String,
    #[schema(value_type = String)]
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub phones: Vec<PhoneSummary>,
    pub pagination: Pagination,
    pub filters: FilterCriteria,
    pub sorting: Sorting,
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    builder: QueryBuilder,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            builder: QueryBuilder::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Unfiltered catalog page in primary-key order.
    pub async fn list_devices(&self, page: i64, limit: i64) -> Result<Timed<DeviceList>> {
        let criteria = FilterCriteria::default();
        let (phones, pagination, sql_query, execution_time) =
            self.page_of(&criteria, &SortSpec::default(), page, limit).await?;

        Ok(Timed {
            data: DeviceList {
                devices: phones,
                pagination,
            },
            sql_query,
            execution_time,
        })
    }

    /// Filtered, sorted page. The response echoes the criteria after
    /// normalization and the sort after allow-list resolution.
    pub async fn search(
        &self,
        criteria: FilterCriteria,
        sort: SortSpec,
        page: i64,
        limit: i64,
    ) -> Result<Timed<SearchResult>> {
        let (phones, pagination, sql_query, execution_time) =
            self.page_of(&criteria, &sort, page, limit).await?;
        let (column, order) = sort.resolve();

        info!(
            matches = pagination.total,
            returned = phones.len(),
            page = pagination.page,
            "Search completed"
        );

        Ok(Timed {
            data: SearchResult {
                phones,
                pagination,
                filters: criteria,
                sorting: Sorting {
                    sort_by: column.qualified().to_string(),
                    sort_order: order,
                },
            },
            sql_query,
            execution_time,
        })
    }

    /// Full record for one phone with its colors and priced variants merged
    /// in under `colors` and `pricing_variants`.
    pub async fn phone_details(&self, phone_id: i64) -> Result<Timed<JsonValue>> {
        if phone_id < 1 {
            return Err(AppError::validation("Phone ID must be a positive integer"));
        }

        let detail = self
            .db
            .execute::<JsonRecord>(&self.builder.detail_query(phone_id))
            .await?;
        let mut record = match detail.rows.into_iter().next() {
            Some(row) => row.record,
            None => {
                return Err(AppError::not_found(format!(
                    "Phone with ID {} not found",
                    phone_id
                )))
            }
        };

        let colors_query = self.builder.colors_query(phone_id);
        let pricing_query = self.builder.pricing_query(phone_id);
        let (colors, pricing) = tokio::try_join!(
            self.db.execute::<ColorRow>(&colors_query),
            self.db.execute::<PricingVariant>(&pricing_query),
        )?;

        let colors: Vec<String> = colors.rows.into_iter().map(|c| c.color_name).collect();
        let variants: Vec<PricingVariant> = pricing
            .rows
            .into_iter()
            .filter(PricingVariant::has_price)
            .collect();

        match record.as_object_mut() {
            Some(fields) => {
                fields.insert("colors".to_string(), serde_json::to_value(colors)?);
                fields.insert("pricing_variants".to_string(), serde_json::to_value(variants)?);
            }
            None => {
                return Err(AppError::Internal(
                    "detail query returned a non-object record".to_string(),
                ))
            }
        }

        Ok(Timed {
            data: record,
            sql_query: detail.sql,
            execution_time: detail.elapsed_ms,
        })
    }

    /// Options for every filter input. A malformed group is logged and left
    /// empty; the other groups are still returned.
    pub async fn filter_options(&self) -> Result<Timed<FilterOptions>> {
        let executed = self
            .db
            .execute::<OptionGroupRow>(&self.builder.filter_options_query())
            .await?;

        let mut options = FilterOptions::default();
        for row in executed.rows {
            match row.kind.as_str() {
                "brands" => options.brands = parse_group::<Vec<BrandOption>>(&row),
                "chipsets" => options.chipsets = parse_group::<Vec<ChipsetOption>>(&row),
                "displayTypes" => {
                    options.display_types = parse_group::<Vec<DisplayTypeOption>>(&row)
                }
                "storageOptions" => options.storage_options = parse_group::<Vec<i64>>(&row),
                "priceRange" => options.price_range = parse_group::<PriceRange>(&row),
                other => warn!(group = other, "Ignoring unknown filter option group"),
            }
        }

        Ok(Timed {
            data: options,
            sql_query: executed.sql,
            execution_time: executed.elapsed_ms,
        })
    }

    /// Runs the list and count statements for the same criteria.
    async fn page_of(
        &self,
        criteria: &FilterCriteria,
        sort: &SortSpec,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<PhoneSummary>, Pagination, String, f64)> {
        let window = PageRequest::clamped(page, limit);
        let list_query = self
            .builder
            .list_query(criteria, sort, window.page(), window.size());
        let count_query = self.builder.count_query(criteria);

        let (listed, counted) = tokio::try_join!(
            self.db.execute::<PhoneSummary>(&list_query),
            self.db.execute::<CountRow>(&count_query),
        )?;

        let total = counted.rows.first().map(|r| r.total).unwrap_or(0);
        let pagination = Pagination {
            page: window.page(),
            limit: window.size(),
            total,
            total_pages: window.total_pages(total),
        };
        Ok((listed.rows, pagination, listed.sql, listed.elapsed_ms))
    }
}

fn parse_group<T: DeserializeOwned + Default>(row: &OptionGroupRow) -> T {
    let Some(value) = row.options.clone() else {
        return T::default();
    };
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                group = %row.kind,
                error = %e,
                "Malformed filter option group, using empty default"
            );
            T::default()
        }
    }
}
