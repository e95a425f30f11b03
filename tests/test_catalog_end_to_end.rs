//! End-to-end run against a real Postgres: reset the schema, seed it through
//! the ingestion writer, then drive every endpoint over HTTP.
//!
//! Needs `DATABASE_URL` (from the environment or `.env`); the catalog tables
//! in that database are dropped and recreated. Skipped when it is unset.

use chrono::NaiveDate;
use phone_catalog::infra::config::{Config, Environment};
use phone_catalog::storage::ingest::{ChipsetInput, PricingInput};
use phone_catalog::storage::{schema, NewPhone};
use phone_catalog::transport::http::{create_router, AppState};
use phone_catalog::{CatalogService, CatalogWriter, Database};
use serde_json::{json, Value};
use std::env;

struct Seed {
    brand: &'static str,
    model: &'static str,
    chipset: &'static str,
    display_type: &'static str,
    ram_gb: i32,
    storage_gb: i32,
    battery: i32,
    screen: f64,
    prices: &'static [(Option<f64>, Option<f64>, &'static str)],
    colors: &'static [&'static str],
}

const SAMSUNG: &str = "Samsung";
const AMOLED_2X: &str = "Dynamic AMOLED 2X";

const SEEDS: &[Seed] = &[
    // 0..=6: Samsung with at least 8 GB of RAM.
    Seed {
        brand: SAMSUNG,
        model: "Galaxy S24",
        chipset: "Exynos 2400",
        display_type: AMOLED_2X,
        ram_gb: 8,
        storage_gb: 256,
        battery: 4000,
        screen: 6.2,
        prices: &[(Some(999.0), Some(1299.0), "256GB"), (None, None, "512GB")],
        colors: &["Onyx Black", "Cobalt Violet"],
    },
    Seed {
        brand: SAMSUNG,
        model: "Galaxy S24+",
        chipset: "Exynos 2400",
        display_type: AMOLED_2X,
        ram_gb: 12,
        storage_gb: 256,
        battery: 4900,
        screen: 6.7,
        prices: &[(Some(999.0), None, "")],
        colors: &[],
    },
    Seed {
        brand: SAMSUNG,
        model: "Galaxy S24 Ultra",
        chipset: "Snapdragon 8 Gen 3",
        display_type: AMOLED_2X,
        ram_gb: 12,
        storage_gb: 512,
        battery: 5000,
        screen: 6.8,
        prices: &[(Some(1299.0), None, "")],
        colors: &[],
    },
    Seed {
        brand: SAMSUNG,
        model: "Galaxy Z Fold5",
        chipset: "Snapdragon 8 Gen 3",
        display_type: AMOLED_2X,
        ram_gb: 12,
        storage_gb: 256,
        battery: 4400,
        screen: 7.6,
        prices: &[(Some(1799.0), None, "")],
        colors: &[],
    },
    Seed {
        brand: SAMSUNG,
        model: "Galaxy Z Flip5",
        chipset: "Snapdragon 8 Gen 3",
        display_type: AMOLED_2X,
        ram_gb: 8,
        storage_gb: 256,
        battery: 3700,
        screen: 6.7,
        prices: &[(Some(999.0), None, "")],
        colors: &[],
    },
    Seed {
        brand: SAMSUNG,
        model: "Galaxy A55",
        chipset: "Exynos 2400",
        display_type: "Super AMOLED",
        ram_gb: 8,
        storage_gb: 128,
        battery: 5000,
        screen: 6.6,
        prices: &[(None, Some(449.0), "")],
        colors: &["Awesome Navy"],
    },
    Seed {
        brand: SAMSUNG,
        model: "Galaxy S23 FE",
        chipset: "Exynos 2400",
        display_type: AMOLED_2X,
        ram_gb: 8,
        storage_gb: 128,
        battery: 4500,
        screen: 6.4,
        prices: &[(Some(599.0), None, "")],
        colors: &[],
    },
    // 7: Samsung below the RAM floor, no chipset on record.
    Seed {
        brand: SAMSUNG,
        model: "Galaxy A15",
        chipset: "",
        display_type: "Super AMOLED",
        ram_gb: 4,
        storage_gb: 128,
        battery: 5000,
        screen: 6.5,
        prices: &[(None, Some(199.0), "")],
        colors: &[],
    },
    Seed {
        brand: "Google",
        model: "Pixel 8",
        chipset: "Tensor G3",
        display_type: "OLED",
        ram_gb: 8,
        storage_gb: 128,
        battery: 4575,
        screen: 6.2,
        prices: &[(Some(699.0), None, "")],
        colors: &[],
    },
    // 9: only an unofficial price, exactly on a price floor of 500.
    Seed {
        brand: "Google",
        model: "Pixel 8a",
        chipset: "Tensor G3",
        display_type: "OLED",
        ram_gb: 8,
        storage_gb: 128,
        battery: 4492,
        screen: 6.1,
        prices: &[(None, Some(500.0), "")],
        colors: &[],
    },
    // 10: no pricing at all.
    Seed {
        brand: "Apple",
        model: "iPhone 15",
        chipset: "",
        display_type: "Super Retina XDR OLED",
        ram_gb: 6,
        storage_gb: 128,
        battery: 3349,
        screen: 6.1,
        prices: &[],
        colors: &["Pink"],
    },
];

const UNUSED_CHIPSETS: &[&str] = &[
    "Dimensity 9300",
    "Dimensity 7200",
    "Helio G99",
    "Kirin 9000S",
    "Unisoc T606",
    "Apple A17 Pro",
    "Snapdragon 7s Gen 2",
];

fn to_new_phone(seed: &Seed) -> NewPhone {
    let mut phone = NewPhone::new(seed.brand, seed.model);
    phone.release_date = NaiveDate::from_ymd_opt(2024, 1, 17);
    phone.specs.chipset = (!seed.chipset.is_empty()).then(|| ChipsetInput {
        name: seed.chipset.to_string(),
        ..ChipsetInput::default()
    });
    phone.specs.display_type = Some(seed.display_type.to_string());
    phone.specs.ram_gb = Some(seed.ram_gb);
    phone.specs.internal_storage_gb = Some(seed.storage_gb);
    phone.specs.battery_capacity = Some(seed.battery);
    phone.display.screen_size = Some(seed.screen);
    phone.colors = seed.colors.iter().map(|c| c.to_string()).collect();
    phone.pricing = seed
        .prices
        .iter()
        .map(|(official, unofficial, variant)| PricingInput {
            price_official: *official,
            price_unofficial: *unofficial,
            variant_description: (!variant.is_empty()).then(|| variant.to_string()),
            ..PricingInput::default()
        })
        .collect();
    phone
}

fn unofficial_price(amount: f64) -> PricingInput {
    PricingInput {
        price_unofficial: Some(amount),
        ..PricingInput::default()
    }
}

fn ids_of(list: &Value) -> Vec<i64> {
    list.as_array()
        .map(|rows| rows.iter().filter_map(|r| r["phone_id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_catalog_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        println!("DATABASE_URL not set; skipping end-to-end catalog test");
        return Ok(());
    }

    println!("--- test_catalog_end_to_end ---");

    let mut config = Config::from_env()?;
    config.environment = Environment::Test;
    let db = Database::connect(&config.database).await?;

    schema::reset(&db).await?;
    schema::apply(&db).await?;
    // Applying twice is a no-op.
    schema::apply(&db).await?;

    let mut writer = CatalogWriter::new(db.clone());
    let ids = writer
        .upsert_all(SEEDS.iter().map(to_new_phone).collect())
        .await?;
    assert_eq!(ids.len(), SEEDS.len());
    println!("seeded phone ids: {:?}, cached lookups: {}", ids, writer.cache().len());

    // Same (brand, model) updates in place.
    let again = writer.upsert_phone(to_new_phone(&SEEDS[0])).await?;
    assert_eq!(again, ids[0]);

    // Ten chipset rows in total, three of them referenced by a phone.
    for name in UNUSED_CHIPSETS {
        sqlx::query("INSERT INTO chipsets (chipset_name) VALUES ($1)")
            .bind(*name)
            .execute(db.pool())
            .await?;
    }
    let chipset_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chipsets")
        .fetch_one(db.pool())
        .await?;
    assert_eq!(chipset_rows, 10);

    let router = create_router(AppState::new(CatalogService::new(db.clone()), config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let base_url = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    let id = |i: usize| ids[i] as i64;

    // --- Health ---
    let health: Value = client.get(format!("{}/health", base_url)).send().await?.json().await?;
    println!("health: {}", health);
    assert_eq!(health["success"], json!(true));
    assert_eq!(health["services"]["database"]["status"], json!("connected"));

    // --- Unfiltered listing ---
    let resp: Value = client
        .get(format!("{}/api/devices?page=1&limit=2", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp["success"], json!(true));
    assert_eq!(
        resp["data"]["pagination"],
        json!({ "page": 1, "limit": 2, "total": 11, "totalPages": 6 })
    );
    assert_eq!(ids_of(&resp["data"]["devices"]), vec![id(0), id(1)]);
    assert!(resp["sqlQuery"].as_str().unwrap_or("").contains("LIMIT 2 OFFSET 0"));
    assert!(resp["executionTime"].as_f64().is_some());

    // Limit above the maximum is clamped.
    let resp: Value = client
        .get(format!("{}/api/devices?limit=500", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp["data"]["pagination"]["limit"], json!(100));
    assert_eq!(resp["data"]["devices"].as_array().map(Vec::len), Some(11));

    // --- Scenario A: brand + RAM floor, first page of two ---
    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({ "filters": { "brand": "Samsung", "ramGb": 8 }, "page": 1, "limit": 5 }))
        .send()
        .await?
        .json()
        .await?;
    println!("scenario A: {}", resp["data"]["pagination"]);
    assert_eq!(resp["data"]["pagination"]["total"], json!(7));
    assert_eq!(resp["data"]["pagination"]["totalPages"], json!(2));
    assert_eq!(ids_of(&resp["data"]["phones"]), (0..5).map(id).collect::<Vec<_>>());
    assert_eq!(resp["data"]["filters"], json!({ "brand": "Samsung", "minRamGb": 8 }));
    assert_eq!(resp["data"]["sorting"], json!({ "sortBy": "p.phone_id", "sortOrder": "asc" }));

    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({ "filters": { "brand": "Samsung", "ramGb": "8GB" }, "page": 2, "limit": 5 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ids_of(&resp["data"]["phones"]), vec![id(5), id(6)]);

    // Equal RAM values fall back to id order.
    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({
            "filters": { "brand": "Samsung", "minRamGb": 8 },
            "sortBy": "ram_gb",
            "sortOrder": "DESC",
            "limit": 5
        }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ids_of(&resp["data"]["phones"]), vec![id(1), id(2), id(3), id(0), id(4)]);
    assert_eq!(resp["data"]["sorting"], json!({ "sortBy": "ps.ram_gb", "sortOrder": "desc" }));

    // --- Scenario B: unknown id ---
    let resp = client
        .get(format!("{}/api/devices/999999", base_url))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(body["error"]["message"], json!("Phone with ID 999999 not found"));

    // --- Scenario C: filter options only list values in use ---
    let resp: Value = client
        .get(format!("{}/api/devices/filters", base_url))
        .send()
        .await?
        .json()
        .await?;
    let options = &resp["data"];
    let names = |group: &str, key: &str| -> Vec<String> {
        options[group]
            .as_array()
            .map(|rows| rows.iter().filter_map(|v| v[key].as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };
    assert_eq!(
        names("chipsets", "chipset_name"),
        vec!["Exynos 2400", "Snapdragon 8 Gen 3", "Tensor G3"]
    );
    assert_eq!(names("brands", "brand_name"), vec!["Apple", "Google", "Samsung"]);
    assert_eq!(options["storageOptions"], json!([128, 256, 512]));
    assert_eq!(options["priceRange"], json!({ "min": 199.0, "max": 1799.0 }));

    // --- Scenario D: price bounds hold if either price satisfies them ---
    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({ "filters": { "priceRange": { "min": 500, "max": 1200 } }, "limit": 100 }))
        .send()
        .await?
        .json()
        .await?;
    let matched = ids_of(&resp["data"]["phones"]);
    println!("scenario D: {:?}", matched);
    assert!(matched.contains(&id(9)), "unofficial price on the floor must match");
    assert!(matched.contains(&id(0)));
    for excluded in [3, 5, 7, 10] {
        assert!(!matched.contains(&id(excluded)), "phone {} should not match", excluded);
    }

    // --- Screen size range is inclusive on both ends; junk sort falls back ---
    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({
            "filters": { "screenSize": { "min": 6.1, "max": 6.2 } },
            "sortBy": "no_such_column; DROP TABLE phones"
        }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ids_of(&resp["data"]["phones"]), vec![id(0), id(8), id(9), id(10)]);
    assert_eq!(resp["data"]["sorting"], json!({ "sortBy": "p.phone_id", "sortOrder": "asc" }));

    // --- A page past the end is empty but still reports the total ---
    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({ "page": 9, "limit": 2 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp["data"]["phones"], json!([]));
    assert_eq!(resp["data"]["pagination"]["total"], json!(11));

    // --- Detail with colors and only the priced variants ---
    let resp: Value = client
        .get(format!("{}/api/devices/{}", base_url, id(0)))
        .send()
        .await?
        .json()
        .await?;
    let phone = &resp["data"]["phone"];
    assert_eq!(phone["brand_name"], json!("Samsung"));
    assert_eq!(phone["model"], json!("Galaxy S24"));
    assert_eq!(phone["chipset_name"], json!("Exynos 2400"));
    assert_eq!(phone["colors"], json!(["Cobalt Violet", "Onyx Black"]));
    let variants = phone["pricing_variants"].as_array().cloned().unwrap_or_default();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0]["price_unofficial"], json!(1299.0));
    assert_eq!(variants[0]["variant_description"], json!("256GB"));

    // --- Price bounds look at every variant, one variant at a time ---
    let mut split = NewPhone::new("Nothing", "Phone (2)");
    split.pricing = vec![unofficial_price(1500.0), unofficial_price(800.0)];
    let split_id = writer.upsert_phone(split).await? as i64;
    let mut straddling = NewPhone::new("Nothing", "Phone (2a)");
    straddling.pricing = vec![unofficial_price(400.0), unofficial_price(1500.0)];
    let straddling_id = writer.upsert_phone(straddling).await? as i64;

    let resp: Value = client
        .post(format!("{}/api/devices/search", base_url))
        .json(&json!({
            "filters": { "brand": "Nothing", "priceRange": { "min": 500, "max": 1200 } }
        }))
        .send()
        .await?
        .json()
        .await?;
    println!("multi-variant price match: {}", resp["data"]["phones"]);
    assert_eq!(ids_of(&resp["data"]["phones"]), vec![split_id]);
    assert_eq!(resp["data"]["pagination"]["total"], json!(1));
    // The listing still shows the primary variant.
    assert_eq!(resp["data"]["phones"][0]["price_unofficial"], json!(1500.0));
    assert!(!ids_of(&resp["data"]["phones"]).contains(&straddling_id));

    // --- Lookups resolve the same way whether or not the cache has seen them ---
    let mut warm = CatalogWriter::new(db.clone());
    let acme_one = warm.upsert_phone(NewPhone::new("Acme", "One")).await?;
    let shout_two = warm.upsert_phone(NewPhone::new("ACME", "Two")).await?;
    let mut cold = CatalogWriter::new(db.clone());
    let shout_three = cold.upsert_phone(NewPhone::new("ACME", "Three")).await?;
    let acme_four = cold.upsert_phone(NewPhone::new(" Acme ", "Four")).await?;

    let brand_of = |phone_id: i32| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_scalar::<_, String>(
                "SELECT b.brand_name FROM phones p
                 JOIN brands b ON p.brand_id = b.brand_id
                 WHERE p.phone_id = $1",
            )
            .bind(phone_id)
            .fetch_one(&pool)
            .await
        }
    };
    assert_eq!(brand_of(acme_one).await?, "Acme");
    assert_eq!(brand_of(acme_four).await?, "Acme");
    assert_eq!(brand_of(shout_two).await?, "ACME");
    assert_eq!(brand_of(shout_three).await?, "ACME");
    let acme_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM brands WHERE lower(brand_name) = 'acme'")
            .fetch_one(db.pool())
            .await?;
    assert_eq!(acme_rows, 2);

    schema::reset(&db).await?;
    db.close().await;
    println!("--- test_catalog_end_to_end done ---");
    Ok(())
}
