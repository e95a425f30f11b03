//! SQL text for the four catalog query shapes: filtered listing, filtered
//! count, single-phone detail and the filter-options aggregate.
//!
//! All functions here are pure. Identifiers come from the column allow-lists,
//! user values only ever travel as bound parameters, and LIMIT/OFFSET are
//! embedded as integers that have been clamped in-process.

use crate::domain::filter::FilterCriteria;
use crate::domain::query::column::SortColumn;
use crate::domain::query::page::PageRequest;
use crate::domain::query::predicate::predicates_for;
use crate::domain::query::render::Renderer;
use crate::domain::query::{SortSpec, SqlParam};
use serde::Serialize;

/// SQL text plus the values for its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl BuiltQuery {
    fn unbound(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

const LISTING_COLUMNS: &str = "SELECT DISTINCT
    p.phone_id,
    b.brand_name,
    p.model,
    p.image_url,
    p.status,
    p.release_date,
    ps.ram_gb,
    ps.internal_storage_gb,
    ps.battery_capacity,
    ds.screen_size,
    dt.display_type_name,
    c.chipset_name,
    pr.price_unofficial,
    pr.price_official";

// The listing shows the primary (lowest pricing_id) variant so a phone
// contributes one row no matter how many variants it has. Price filters test
// every variant through their own EXISTS subquery.
const LISTING_FROM: &str = "
FROM phones p
INNER JOIN brands b ON p.brand_id = b.brand_id
LEFT JOIN phone_specifications ps ON p.phone_id = ps.phone_id
LEFT JOIN display_specifications ds ON p.phone_id = ds.phone_id
LEFT JOIN display_types dt ON ps.display_type_id = dt.display_type_id
LEFT JOIN chipsets c ON ps.chipset_id = c.chipset_id
LEFT JOIN (
    SELECT DISTINCT ON (phone_id) phone_id, price_unofficial, price_official
    FROM phone_pricing
    ORDER BY phone_id, pricing_id
) pr ON pr.phone_id = p.phone_id";

const DETAIL_SQL: &str = "SELECT row_to_json(detail) AS record
FROM (
    SELECT
        p.phone_id,
        p.model,
        p.device_type,
        p.release_date,
        p.status,
        p.detail_url,
        p.image_url,
        p.scraped_at,
        b.brand_name,
        ps.cpu,
        ps.cpu_cores,
        ps.gpu,
        ps.ram_gb,
        ps.internal_storage_gb,
        ps.expandable_memory,
        ps.battery_capacity,
        ps.quick_charging,
        ps.bluetooth_version,
        ps.network,
        ps.wlan,
        ps.usb,
        ps.usb_otg,
        ps.usb_type_c,
        ds.screen_size,
        ds.resolution,
        ds.pixel_density,
        ds.refresh_rate,
        ds.brightness,
        ds.aspect_ratio,
        ds.screen_protection,
        ds.screen_to_body_ratio,
        ds.touch_screen,
        ds.notch,
        ds.edge,
        phys.height,
        phys.width,
        phys.thickness,
        phys.weight,
        phys.ip_rating,
        phys.waterproof,
        phys.ruggedness,
        cam.primary_camera_resolution,
        cam.primary_camera_features,
        cam.primary_camera_autofocus,
        cam.primary_camera_flash,
        cam.primary_camera_image_resolution,
        cam.video,
        audio.audio_jack,
        audio.loudspeaker,
        feat.features,
        feat.face_unlock,
        feat.gps,
        feat.gprs,
        feat.volte,
        feat.sim_size,
        feat.sim_slot,
        feat.speed,
        c.chipset_name,
        c.architecture,
        c.fabrication,
        os.os_name,
        os.os_version,
        os.user_interface,
        dt.display_type_name,
        st.storage_type_name,
        rt.ram_type_name,
        pr.price_official,
        pr.price_unofficial,
        pr.price_old,
        pr.price_savings,
        pr.price_updated,
        pr.variant_description
    FROM phones p
    INNER JOIN brands b ON p.brand_id = b.brand_id
    LEFT JOIN phone_specifications ps ON p.phone_id = ps.phone_id
    LEFT JOIN display_specifications ds ON p.phone_id = ds.phone_id
    LEFT JOIN physical_specifications phys ON p.phone_id = phys.phone_id
    LEFT JOIN camera_specifications cam ON p.phone_id = cam.phone_id
    LEFT JOIN audio_features audio ON p.phone_id = audio.phone_id
    LEFT JOIN additional_features feat ON p.phone_id = feat.phone_id
    LEFT JOIN chipsets c ON ps.chipset_id = c.chipset_id
    LEFT JOIN operating_systems os ON ps.os_id = os.os_id
    LEFT JOIN display_types dt ON ps.display_type_id = dt.display_type_id
    LEFT JOIN storage_types st ON ps.storage_type_id = st.storage_type_id
    LEFT JOIN ram_types rt ON ps.ram_type_id = rt.ram_type_id
    LEFT JOIN LATERAL (
        SELECT price_official, price_unofficial, price_old, price_savings,
               price_updated, variant_description
        FROM phone_pricing
        WHERE phone_pricing.phone_id = p.phone_id
        ORDER BY pricing_id
        LIMIT 1
    ) pr ON TRUE
    WHERE p.phone_id = $1
    LIMIT 1
) detail";

const COLORS_SQL: &str = "SELECT color_name
FROM phone_colors
WHERE phone_id = $1
ORDER BY color_name";

const PRICING_SQL: &str = "SELECT
    pricing_id,
    price_official,
    price_unofficial,
    price_old,
    price_savings,
    price_updated,
    variant_description
FROM phone_pricing
WHERE phone_id = $1
ORDER BY pricing_id";

// Lookup rows only appear when at least one phone references them. Prices
// treat NULL and 0 as absent; LEAST/GREATEST skip NULL arguments.
const FILTER_OPTIONS_SQL: &str = "SELECT
    'brands'::text AS kind,
    COALESCE(
        json_agg(json_build_object('brand_id', b.brand_id, 'brand_name', b.brand_name)
                 ORDER BY b.brand_name),
        '[]'::json
    ) AS options
FROM brands b
WHERE b.brand_id IN (SELECT DISTINCT brand_id FROM phones)

UNION ALL

SELECT
    'chipsets'::text AS kind,
    COALESCE(
        json_agg(json_build_object('chipset_id', c.chipset_id, 'chipset_name', c.chipset_name)
                 ORDER BY c.chipset_name),
        '[]'::json
    ) AS options
FROM chipsets c
WHERE c.chipset_id IN (
    SELECT DISTINCT chipset_id FROM phone_specifications WHERE chipset_id IS NOT NULL
)

UNION ALL

SELECT
    'displayTypes'::text AS kind,
    COALESCE(
        json_agg(json_build_object('display_type_id', dt.display_type_id,
                                   'display_type_name', dt.display_type_name)
                 ORDER BY dt.display_type_name),
        '[]'::json
    ) AS options
FROM display_types dt
WHERE dt.display_type_id IN (
    SELECT DISTINCT display_type_id FROM phone_specifications WHERE display_type_id IS NOT NULL
)

UNION ALL

SELECT
    'storageOptions'::text AS kind,
    COALESCE(json_agg(s.internal_storage_gb ORDER BY s.internal_storage_gb), '[]'::json) AS options
FROM (
    SELECT DISTINCT internal_storage_gb
    FROM phone_specifications
    WHERE internal_storage_gb IS NOT NULL
) s

UNION ALL

SELECT
    'priceRange'::text AS kind,
    json_build_object(
        'min', COALESCE(MIN(LEAST(NULLIF(price_unofficial, 0), NULLIF(price_official, 0))), 0),
        'max', COALESCE(MAX(GREATEST(NULLIF(price_unofficial, 0), NULLIF(price_official, 0))), 0)
    ) AS options
FROM phone_pricing
WHERE (price_unofficial IS NOT NULL AND price_unofficial > 0)
   OR (price_official IS NOT NULL AND price_official > 0)";

/// Stateless builder for catalog statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder
    }

    /// Filtered, sorted page of phones. `page` and `page_size` are clamped
    /// here regardless of any validation the caller already did.
    pub fn list_query(
        &self,
        criteria: &FilterCriteria,
        sort: &SortSpec,
        page: i64,
        page_size: i64,
    ) -> BuiltQuery {
        let window = PageRequest::clamped(page, page_size);
        let (where_clause, params) = self.filter_clause(criteria);
        let (column, order) = sort.resolve();

        let mut sql = String::with_capacity(1024);
        sql.push_str(LISTING_COLUMNS);
        sql.push_str(LISTING_FROM);
        sql.push_str(&where_clause);
        sql.push_str(&format!("\nORDER BY {} {}", column.qualified(), order.as_sql()));
        if column != SortColumn::PhoneId {
            sql.push_str(", p.phone_id ASC");
        }
        sql.push_str(&format!(
            "\nLIMIT {} OFFSET {}",
            window.size(),
            window.offset()
        ));

        BuiltQuery { sql, params }
    }

    /// Number of distinct phones matching `criteria`; shares its WHERE clause
    /// with [`QueryBuilder::list_query`].
    pub fn count_query(&self, criteria: &FilterCriteria) -> BuiltQuery {
        let (where_clause, params) = self.filter_clause(criteria);
        let mut sql = String::from("SELECT COUNT(DISTINCT p.phone_id) AS total");
        sql.push_str(LISTING_FROM);
        sql.push_str(&where_clause);
        BuiltQuery { sql, params }
    }

    /// Full record for one phone as a single JSON column named `record`.
    /// Zero rows means the phone does not exist.
    pub fn detail_query(&self, phone_id: i64) -> BuiltQuery {
        BuiltQuery {
            sql: DETAIL_SQL.to_string(),
            params: vec![SqlParam::Int(phone_id)],
        }
    }

    pub fn colors_query(&self, phone_id: i64) -> BuiltQuery {
        BuiltQuery {
            sql: COLORS_SQL.to_string(),
            params: vec![SqlParam::Int(phone_id)],
        }
    }

    pub fn pricing_query(&self, phone_id: i64) -> BuiltQuery {
        BuiltQuery {
            sql: PRICING_SQL.to_string(),
            params: vec![SqlParam::Int(phone_id)],
        }
    }

    /// One `(kind, options)` row per option group: brands, chipsets,
    /// displayTypes, storageOptions and priceRange.
    pub fn filter_options_query(&self) -> BuiltQuery {
        BuiltQuery::unbound(FILTER_OPTIONS_SQL)
    }

    /// The WHERE fragments alone, in bind order, for callers that want to
    /// inspect or display them.
    pub fn filter_fragments(&self, criteria: &FilterCriteria) -> (Vec<String>, Vec<SqlParam>) {
        let mut renderer = Renderer::new();
        let fragments = renderer.fragments(&predicates_for(criteria));
        (fragments, renderer.into_params())
    }

    fn filter_clause(&self, criteria: &FilterCriteria) -> (String, Vec<SqlParam>) {
        let mut renderer = Renderer::new();
        let clause = renderer.where_clause(&predicates_for(criteria));
        (clause, renderer.into_params())
    }
}
