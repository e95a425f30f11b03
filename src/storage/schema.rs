//! Catalog DDL. Every statement is idempotent, so `apply` is safe to run on
//! each start.

use crate::error::{AppError, Result};
use crate::storage::database::Database;
use futures_util::FutureExt;
use tracing::info;

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS brands (
        brand_id SERIAL PRIMARY KEY,
        brand_name VARCHAR(100) NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS chipsets (
        chipset_id SERIAL PRIMARY KEY,
        chipset_name VARCHAR(200) NOT NULL UNIQUE,
        architecture VARCHAR(100),
        fabrication VARCHAR(50)
    )",
    "CREATE TABLE IF NOT EXISTS operating_systems (
        os_id SERIAL PRIMARY KEY,
        os_name VARCHAR(100) NOT NULL,
        os_version VARCHAR(100) NOT NULL DEFAULT '',
        user_interface VARCHAR(100),
        UNIQUE (os_name, os_version)
    )",
    "CREATE TABLE IF NOT EXISTS display_types (
        display_type_id SERIAL PRIMARY KEY,
        display_type_name VARCHAR(100) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS storage_types (
        storage_type_id SERIAL PRIMARY KEY,
        storage_type_name VARCHAR(100) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS ram_types (
        ram_type_id SERIAL PRIMARY KEY,
        ram_type_name VARCHAR(100) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS phones (
        phone_id SERIAL PRIMARY KEY,
        brand_id INTEGER NOT NULL REFERENCES brands (brand_id),
        model VARCHAR(200) NOT NULL,
        device_type VARCHAR(50),
        release_date DATE,
        status VARCHAR(20) NOT NULL DEFAULT 'Available'
            CHECK (status IN ('Available', 'Upcoming', 'Rumored', 'Discontinued')),
        detail_url TEXT,
        image_url TEXT,
        scraped_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (brand_id, model)
    )",
    "CREATE TABLE IF NOT EXISTS phone_specifications (
        phone_id INTEGER PRIMARY KEY REFERENCES phones (phone_id) ON DELETE CASCADE,
        chipset_id INTEGER REFERENCES chipsets (chipset_id),
        os_id INTEGER REFERENCES operating_systems (os_id),
        display_type_id INTEGER REFERENCES display_types (display_type_id),
        storage_type_id INTEGER REFERENCES storage_types (storage_type_id),
        ram_type_id INTEGER REFERENCES ram_types (ram_type_id),
        cpu VARCHAR(200),
        cpu_cores VARCHAR(50),
        gpu VARCHAR(100),
        ram_gb INTEGER,
        internal_storage_gb INTEGER,
        expandable_memory VARCHAR(100),
        battery_capacity INTEGER,
        quick_charging VARCHAR(100),
        bluetooth_version VARCHAR(50),
        network VARCHAR(200),
        wlan VARCHAR(200),
        usb VARCHAR(100),
        usb_otg VARCHAR(20),
        usb_type_c VARCHAR(20)
    )",
    "CREATE TABLE IF NOT EXISTS display_specifications (
        phone_id INTEGER PRIMARY KEY REFERENCES phones (phone_id) ON DELETE CASCADE,
        screen_size DOUBLE PRECISION,
        resolution VARCHAR(100),
        pixel_density VARCHAR(50),
        refresh_rate VARCHAR(50),
        brightness VARCHAR(50),
        aspect_ratio VARCHAR(50),
        screen_protection VARCHAR(100),
        screen_to_body_ratio VARCHAR(50),
        touch_screen VARCHAR(100),
        notch VARCHAR(50),
        edge VARCHAR(50)
    )",
    "CREATE TABLE IF NOT EXISTS physical_specifications (
        phone_id INTEGER PRIMARY KEY REFERENCES phones (phone_id) ON DELETE CASCADE,
        height VARCHAR(50),
        width VARCHAR(50),
        thickness VARCHAR(50),
        weight VARCHAR(50),
        ip_rating VARCHAR(50),
        waterproof VARCHAR(100),
        ruggedness VARCHAR(100)
    )",
    "CREATE TABLE IF NOT EXISTS camera_specifications (
        phone_id INTEGER PRIMARY KEY REFERENCES phones (phone_id) ON DELETE CASCADE,
        primary_camera_resolution VARCHAR(200),
        primary_camera_features TEXT,
        primary_camera_autofocus VARCHAR(20),
        primary_camera_flash VARCHAR(100),
        primary_camera_image_resolution VARCHAR(100),
        video VARCHAR(200)
    )",
    "CREATE TABLE IF NOT EXISTS audio_features (
        phone_id INTEGER PRIMARY KEY REFERENCES phones (phone_id) ON DELETE CASCADE,
        audio_jack VARCHAR(50),
        loudspeaker VARCHAR(50)
    )",
    "CREATE TABLE IF NOT EXISTS additional_features (
        phone_id INTEGER PRIMARY KEY REFERENCES phones (phone_id) ON DELETE CASCADE,
        features TEXT,
        face_unlock VARCHAR(20),
        gps VARCHAR(100),
        gprs VARCHAR(20),
        volte VARCHAR(20),
        sim_size VARCHAR(100),
        sim_slot VARCHAR(100),
        speed VARCHAR(100)
    )",
    "CREATE TABLE IF NOT EXISTS phone_colors (
        color_id SERIAL PRIMARY KEY,
        phone_id INTEGER NOT NULL REFERENCES phones (phone_id) ON DELETE CASCADE,
        color_name VARCHAR(100) NOT NULL,
        UNIQUE (phone_id, color_name)
    )",
    "CREATE TABLE IF NOT EXISTS phone_pricing (
        pricing_id SERIAL PRIMARY KEY,
        phone_id INTEGER NOT NULL REFERENCES phones (phone_id) ON DELETE CASCADE,
        price_official DOUBLE PRECISION,
        price_unofficial DOUBLE PRECISION,
        price_old DOUBLE PRECISION,
        price_savings DOUBLE PRECISION,
        price_updated DATE,
        variant_description TEXT
    )",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_phones_brand ON phones (brand_id)",
    "CREATE INDEX IF NOT EXISTS idx_phones_status ON phones (status)",
    "CREATE INDEX IF NOT EXISTS idx_specs_chipset ON phone_specifications (chipset_id)",
    "CREATE INDEX IF NOT EXISTS idx_specs_display_type ON phone_specifications (display_type_id)",
    "CREATE INDEX IF NOT EXISTS idx_specs_ram ON phone_specifications (ram_gb)",
    "CREATE INDEX IF NOT EXISTS idx_specs_storage ON phone_specifications (internal_storage_gb)",
    "CREATE INDEX IF NOT EXISTS idx_specs_battery ON phone_specifications (battery_capacity)",
    "CREATE INDEX IF NOT EXISTS idx_display_screen_size ON display_specifications (screen_size)",
    "CREATE INDEX IF NOT EXISTS idx_pricing_phone ON phone_pricing (phone_id, pricing_id)",
];

// Children before parents.
const DROP_ORDER: &[&str] = &[
    "phone_pricing",
    "phone_colors",
    "additional_features",
    "audio_features",
    "camera_specifications",
    "physical_specifications",
    "display_specifications",
    "phone_specifications",
    "phones",
    "ram_types",
    "storage_types",
    "display_types",
    "operating_systems",
    "chipsets",
    "brands",
];

/// Creates every catalog table and index that does not exist yet, in one
/// transaction.
pub async fn apply(db: &Database) -> Result<()> {
    db.with_transaction(|tx| {
        async move {
            for ddl in TABLES.iter().chain(INDEXES.iter()) {
                sqlx::query(ddl).execute(tx.as_mut()).await?;
            }
            Ok::<_, AppError>(())
        }
        .boxed()
    })
    .await?;
    info!(tables = TABLES.len(), indexes = INDEXES.len(), "Catalog schema ready");
    Ok(())
}

/// Drops every catalog table. Used to start test runs from a clean slate.
pub async fn reset(db: &Database) -> Result<()> {
    db.with_transaction(|tx| {
        async move {
            for table in DROP_ORDER {
                sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
                    .execute(tx.as_mut())
                    .await?;
            }
            Ok::<_, AppError>(())
        }
        .boxed()
    })
    .await?;
    info!("Catalog schema dropped");
    Ok(())
}
