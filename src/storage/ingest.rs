//! Catalog ingestion: writes typed phone records into the normalized schema.
//!
//! Lookup rows (brands, chipsets, operating systems, display, storage and RAM
//! types) are created on first sight and de-duplicated by natural key. Phones
//! are upserted by (brand, model); each one-to-one extension by `phone_id`.

use crate::domain::catalog::PhoneStatus;
use crate::error::{AppError, Result};
use crate::storage::database::Database;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::FutureExt;
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Brand,
    Chipset,
    OperatingSystem,
    DisplayType,
    StorageType,
    RamType,
}

impl LookupKind {
    /// `(table, id column, name column)`.
    fn table(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            LookupKind::Brand => ("brands", "brand_id", "brand_name"),
            LookupKind::Chipset => ("chipsets", "chipset_id", "chipset_name"),
            LookupKind::OperatingSystem => ("operating_systems", "os_id", "os_name"),
            LookupKind::DisplayType => ("display_types", "display_type_id", "display_type_name"),
            LookupKind::StorageType => ("storage_types", "storage_type_id", "storage_type_name"),
            LookupKind::RamType => ("ram_types", "ram_type_id", "ram_type_name"),
        }
    }
}

/// Natural key -> id, populated lazily as lookups are resolved. Keys are the
/// trimmed name with its case kept, matching the unique constraints on the
/// lookup tables.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    ids: HashMap<(LookupKind, String), i32>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize_key(name: &str) -> String {
        name.trim().to_string()
    }

    pub fn get(&self, kind: LookupKind, name: &str) -> Option<i32> {
        self.ids.get(&(kind, Self::normalize_key(name))).copied()
    }

    pub fn insert(&mut self, kind: LookupKind, name: &str, id: i32) {
        self.ids.insert((kind, Self::normalize_key(name)), id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChipsetInput {
    pub name: String,
    pub architecture: Option<String>,
    pub fabrication: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OsInput {
    pub name: String,
    pub version: Option<String>,
    pub user_interface: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SpecsInput {
    pub chipset: Option<ChipsetInput>,
    pub os: Option<OsInput>,
    pub display_type: Option<String>,
    pub storage_type: Option<String>,
    pub ram_type: Option<String>,
    pub cpu: Option<String>,
    pub cpu_cores: Option<String>,
    pub gpu: Option<String>,
    pub ram_gb: Option<i32>,
    pub internal_storage_gb: Option<i32>,
    pub expandable_memory: Option<String>,
    pub battery_capacity: Option<i32>,
    pub quick_charging: Option<String>,
    pub bluetooth_version: Option<String>,
    pub network: Option<String>,
    pub wlan: Option<String>,
    pub usb: Option<String>,
    pub usb_otg: Option<String>,
    pub usb_type_c: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DisplayInput {
    pub screen_size: Option<f64>,
    pub resolution: Option<String>,
    pub pixel_density: Option<String>,
    pub refresh_rate: Option<String>,
    pub brightness: Option<String>,
    pub aspect_ratio: Option<String>,
    pub screen_protection: Option<String>,
    pub screen_to_body_ratio: Option<String>,
    pub touch_screen: Option<String>,
    pub notch: Option<String>,
    pub edge: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicalInput {
    pub height: Option<String>,
    pub width: Option<String>,
    pub thickness: Option<String>,
    pub weight: Option<String>,
    pub ip_rating: Option<String>,
    pub waterproof: Option<String>,
    pub ruggedness: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    pub primary_camera_resolution: Option<String>,
    pub primary_camera_features: Option<String>,
    pub primary_camera_autofocus: Option<String>,
    pub primary_camera_flash: Option<String>,
    pub primary_camera_image_resolution: Option<String>,
    pub video: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AudioInput {
    pub audio_jack: Option<String>,
    pub loudspeaker: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeaturesInput {
    pub features: Option<String>,
    pub face_unlock: Option<String>,
    pub gps: Option<String>,
    pub gprs: Option<String>,
    pub volte: Option<String>,
    pub sim_size: Option<String>,
    pub sim_slot: Option<String>,
    pub speed: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PricingInput {
    pub price_official: Option<f64>,
    pub price_unofficial: Option<f64>,
    pub price_old: Option<f64>,
    pub price_savings: Option<f64>,
    pub price_updated: Option<NaiveDate>,
    pub variant_description: Option<String>,
}

/// One phone with everything the catalog stores about it.
#[derive(Debug, Clone, Default)]
pub struct NewPhone {
    pub brand: String,
    pub model: String,
    pub device_type: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub status: PhoneStatus,
    pub detail_url: Option<String>,
    pub image_url: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
    pub specs: SpecsInput,
    pub display: DisplayInput,
    pub physical: PhysicalInput,
    pub camera: CameraInput,
    pub audio: AudioInput,
    pub features: FeaturesInput,
    pub colors: Vec<String>,
    /// Replaces whatever variants the phone had before.
    pub pricing: Vec<PricingInput>,
}

impl NewPhone {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Parses a free-text amount such as `"$1,299.00"`; anything without digits
/// is absent.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

enum Cell<'a> {
    Text(&'a Option<String>),
    Int(Option<i32>),
    Float(Option<f64>),
}

/// Writes phones one transaction at a time. The lookup cache only learns ids
/// from committed transactions.
pub struct CatalogWriter {
    db: Database,
    cache: LookupCache,
}

impl CatalogWriter {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: LookupCache::new(),
        }
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Inserts or updates `phone` and returns its id.
    pub async fn upsert_phone(&mut self, phone: NewPhone) -> Result<i32> {
        if phone.brand.trim().is_empty() || phone.model.trim().is_empty() {
            return Err(AppError::validation("Phone brand and model are required"));
        }

        let cache = self.cache.clone();
        let (phone_id, cache) = self
            .db
            .with_transaction(move |tx| {
                async move {
                    let mut cache = cache;
                    let phone_id = write_phone(tx.as_mut(), &mut cache, &phone).await?;
                    Ok::<_, AppError>((phone_id, cache))
                }
                .boxed()
            })
            .await?;
        self.cache = cache;
        Ok(phone_id)
    }

    /// Writes every phone in order, stopping at the first failure. Phones
    /// written before the failure stay committed.
    pub async fn upsert_all(&mut self, phones: Vec<NewPhone>) -> Result<Vec<i32>> {
        let mut ids = Vec::with_capacity(phones.len());
        for phone in phones {
            ids.push(self.upsert_phone(phone).await?);
        }
        Ok(ids)
    }
}

async fn write_phone(
    conn: &mut PgConnection,
    cache: &mut LookupCache,
    phone: &NewPhone,
) -> Result<i32> {
    let brand_id = resolve_named(conn, cache, LookupKind::Brand, phone.brand.trim()).await?;

    let phone_id: i32 = sqlx::query_scalar(
        "INSERT INTO phones
            (brand_id, model, device_type, release_date, status, detail_url, image_url, scraped_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (brand_id, model) DO UPDATE SET
            device_type = EXCLUDED.device_type,
            release_date = EXCLUDED.release_date,
            status = EXCLUDED.status,
            detail_url = EXCLUDED.detail_url,
            image_url = EXCLUDED.image_url,
            scraped_at = EXCLUDED.scraped_at,
            updated_at = NOW()
         RETURNING phone_id",
    )
    .bind(brand_id)
    .bind(phone.model.trim())
    .bind(phone.device_type.as_deref().unwrap_or("Smartphone"))
    .bind(phone.release_date)
    .bind(phone.status.as_str())
    .bind(phone.detail_url.as_deref())
    .bind(phone.image_url.as_deref())
    .bind(phone.scraped_at)
    .fetch_one(&mut *conn)
    .await?;

    let specs = &phone.specs;
    let chipset_id = match &specs.chipset {
        Some(chipset) if !chipset.name.trim().is_empty() => {
            Some(resolve_chipset(conn, cache, chipset).await?)
        }
        _ => None,
    };
    let os_id = match &specs.os {
        Some(os) if !os.name.trim().is_empty() => Some(resolve_os(conn, cache, os).await?),
        _ => None,
    };
    let display_type_id =
        resolve_optional(conn, cache, LookupKind::DisplayType, &specs.display_type).await?;
    let storage_type_id =
        resolve_optional(conn, cache, LookupKind::StorageType, &specs.storage_type).await?;
    let ram_type_id =
        resolve_optional(conn, cache, LookupKind::RamType, &specs.ram_type).await?;

    upsert_extension(
        conn,
        "phone_specifications",
        phone_id,
        &[
            ("chipset_id", Cell::Int(chipset_id)),
            ("os_id", Cell::Int(os_id)),
            ("display_type_id", Cell::Int(display_type_id)),
            ("storage_type_id", Cell::Int(storage_type_id)),
            ("ram_type_id", Cell::Int(ram_type_id)),
            ("cpu", Cell::Text(&specs.cpu)),
            ("cpu_cores", Cell::Text(&specs.cpu_cores)),
            ("gpu", Cell::Text(&specs.gpu)),
            ("ram_gb", Cell::Int(specs.ram_gb)),
            ("internal_storage_gb", Cell::Int(specs.internal_storage_gb)),
            ("expandable_memory", Cell::Text(&specs.expandable_memory)),
            ("battery_capacity", Cell::Int(specs.battery_capacity)),
            ("quick_charging", Cell::Text(&specs.quick_charging)),
            ("bluetooth_version", Cell::Text(&specs.bluetooth_version)),
            ("network", Cell::Text(&specs.network)),
            ("wlan", Cell::Text(&specs.wlan)),
            ("usb", Cell::Text(&specs.usb)),
            ("usb_otg", Cell::Text(&specs.usb_otg)),
            ("usb_type_c", Cell::Text(&specs.usb_type_c)),
        ],
    )
    .await?;

    let display = &phone.display;
    upsert_extension(
        conn,
        "display_specifications",
        phone_id,
        &[
            ("screen_size", Cell::Float(display.screen_size)),
            ("resolution", Cell::Text(&display.resolution)),
            ("pixel_density", Cell::Text(&display.pixel_density)),
            ("refresh_rate", Cell::Text(&display.refresh_rate)),
            ("brightness", Cell::Text(&display.brightness)),
            ("aspect_ratio", Cell::Text(&display.aspect_ratio)),
            ("screen_protection", Cell::Text(&display.screen_protection)),
            ("screen_to_body_ratio", Cell::Text(&display.screen_to_body_ratio)),
            ("touch_screen", Cell::Text(&display.touch_screen)),
            ("notch", Cell::Text(&display.notch)),
            ("edge", Cell::Text(&display.edge)),
        ],
    )
    .await?;

    let physical = &phone.physical;
    upsert_extension(
        conn,
        "physical_specifications",
        phone_id,
        &[
            ("height", Cell::Text(&physical.height)),
            ("width", Cell::Text(&physical.width)),
            ("thickness", Cell::Text(&physical.thickness)),
            ("weight", Cell::Text(&physical.weight)),
            ("ip_rating", Cell::Text(&physical.ip_rating)),
            ("waterproof", Cell::Text(&physical.waterproof)),
            ("ruggedness", Cell::Text(&physical.ruggedness)),
        ],
    )
    .await?;

    let camera = &phone.camera;
    upsert_extension(
        conn,
        "camera_specifications",
        phone_id,
        &[
            ("primary_camera_resolution", Cell::Text(&camera.primary_camera_resolution)),
            ("primary_camera_features", Cell::Text(&camera.primary_camera_features)),
            ("primary_camera_autofocus", Cell::Text(&camera.primary_camera_autofocus)),
            ("primary_camera_flash", Cell::Text(&camera.primary_camera_flash)),
            (
                "primary_camera_image_resolution",
                Cell::Text(&camera.primary_camera_image_resolution),
            ),
            ("video", Cell::Text(&camera.video)),
        ],
    )
    .await?;

    upsert_extension(
        conn,
        "audio_features",
        phone_id,
        &[
            ("audio_jack", Cell::Text(&phone.audio.audio_jack)),
            ("loudspeaker", Cell::Text(&phone.audio.loudspeaker)),
        ],
    )
    .await?;

    let features = &phone.features;
    upsert_extension(
        conn,
        "additional_features",
        phone_id,
        &[
            ("features", Cell::Text(&features.features)),
            ("face_unlock", Cell::Text(&features.face_unlock)),
            ("gps", Cell::Text(&features.gps)),
            ("gprs", Cell::Text(&features.gprs)),
            ("volte", Cell::Text(&features.volte)),
            ("sim_size", Cell::Text(&features.sim_size)),
            ("sim_slot", Cell::Text(&features.sim_slot)),
            ("speed", Cell::Text(&features.speed)),
        ],
    )
    .await?;

    for color in phone.colors.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        sqlx::query(
            "INSERT INTO phone_colors (phone_id, color_name) VALUES ($1, $2)
             ON CONFLICT (phone_id, color_name) DO NOTHING",
        )
        .bind(phone_id)
        .bind(color)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("DELETE FROM phone_pricing WHERE phone_id = $1")
        .bind(phone_id)
        .execute(&mut *conn)
        .await?;
    for variant in &phone.pricing {
        sqlx::query(
            "INSERT INTO phone_pricing
                (phone_id, price_official, price_unofficial, price_old, price_savings,
                 price_updated, variant_description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(phone_id)
        .bind(variant.price_official)
        .bind(variant.price_unofficial)
        .bind(variant.price_old)
        .bind(variant.price_savings)
        .bind(variant.price_updated)
        .bind(variant.variant_description.as_deref())
        .execute(&mut *conn)
        .await?;
    }

    debug!(phone_id, brand = %phone.brand, model = %phone.model, "Phone written");
    Ok(phone_id)
}

async fn resolve_optional(
    conn: &mut PgConnection,
    cache: &mut LookupCache,
    kind: LookupKind,
    name: &Option<String>,
) -> Result<Option<i32>> {
    match name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Ok(Some(resolve_named(conn, cache, kind, name).await?)),
        None => Ok(None),
    }
}

async fn resolve_named(
    conn: &mut PgConnection,
    cache: &mut LookupCache,
    kind: LookupKind,
    name: &str,
) -> Result<i32> {
    if let Some(id) = cache.get(kind, name) {
        return Ok(id);
    }
    let (table, id_col, name_col) = kind.table();
    let sql = format!(
        "INSERT INTO {table} ({name_col}) VALUES ($1)
         ON CONFLICT ({name_col}) DO UPDATE SET {name_col} = EXCLUDED.{name_col}
         RETURNING {id_col}"
    );
    let id: i32 = sqlx::query_scalar(&sql).bind(name).fetch_one(&mut *conn).await?;
    cache.insert(kind, name, id);
    Ok(id)
}

async fn resolve_chipset(
    conn: &mut PgConnection,
    cache: &mut LookupCache,
    chipset: &ChipsetInput,
) -> Result<i32> {
    let name = chipset.name.trim();
    if let Some(id) = cache.get(LookupKind::Chipset, name) {
        return Ok(id);
    }
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO chipsets (chipset_name, architecture, fabrication) VALUES ($1, $2, $3)
         ON CONFLICT (chipset_name) DO UPDATE SET
            architecture = COALESCE(EXCLUDED.architecture, chipsets.architecture),
            fabrication = COALESCE(EXCLUDED.fabrication, chipsets.fabrication)
         RETURNING chipset_id",
    )
    .bind(name)
    .bind(chipset.architecture.as_deref())
    .bind(chipset.fabrication.as_deref())
    .fetch_one(&mut *conn)
    .await?;
    cache.insert(LookupKind::Chipset, name, id);
    Ok(id)
}

async fn resolve_os(
    conn: &mut PgConnection,
    cache: &mut LookupCache,
    os: &OsInput,
) -> Result<i32> {
    let name = os.name.trim();
    let version = os.version.as_deref().map(str::trim).unwrap_or("");
    let key = format!("{}|{}", name, version);
    if let Some(id) = cache.get(LookupKind::OperatingSystem, &key) {
        return Ok(id);
    }
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO operating_systems (os_name, os_version, user_interface) VALUES ($1, $2, $3)
         ON CONFLICT (os_name, os_version) DO UPDATE SET
            user_interface = COALESCE(EXCLUDED.user_interface, operating_systems.user_interface)
         RETURNING os_id",
    )
    .bind(name)
    .bind(version)
    .bind(os.user_interface.as_deref())
    .fetch_one(&mut *conn)
    .await?;
    cache.insert(LookupKind::OperatingSystem, &key, id);
    Ok(id)
}

/// `INSERT ... ON CONFLICT (phone_id) DO UPDATE` over a one-to-one extension
/// table. Table and column names are compile-time constants.
async fn upsert_extension(
    conn: &mut PgConnection,
    table: &'static str,
    phone_id: i32,
    cells: &[(&'static str, Cell<'_>)],
) -> Result<()> {
    let columns: Vec<&str> = cells.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (2..=cells.len() + 1).map(|n| format!("${}", n)).collect();
    let updates: Vec<String> = columns
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();
    let sql = format!(
        "INSERT INTO {} (phone_id, {}) VALUES ($1, {}) ON CONFLICT (phone_id) DO UPDATE SET {}",
        table,
        columns.join(", "),
        placeholders.join(", "),
        updates.join(", ")
    );

    let mut statement = sqlx::query(&sql).bind(phone_id);
    for (_, cell) in cells {
        statement = match cell {
            Cell::Text(v) => statement.bind(v.as_deref()),
            Cell::Int(v) => statement.bind(*v),
            Cell::Float(v) => statement.bind(*v),
        };
    }
    statement.execute(&mut *conn).await?;
    Ok(())
}
