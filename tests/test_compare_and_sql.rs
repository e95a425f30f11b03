use phone_catalog::client::pretty_sql;
use phone_catalog::domain::compare::{ComparisonRow, NOT_AVAILABLE};
use phone_catalog::ComparisonTable;
use serde_json::{json, Map, Value};

fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn row<'a>(table: &'a ComparisonTable, label: &str) -> &'a ComparisonRow {
    table
        .rows
        .iter()
        .find(|r| r.label == label)
        .unwrap_or_else(|| panic!("no row {}", label))
}

#[test]
fn comparison_formats_and_highlights() {
    let phones = vec![
        record(json!({
            "brand_name": "Samsung",
            "model": "Galaxy S24",
            "status": "Available",
            "release_date": "2024-01-17",
            "chipset_name": "Exynos 2400",
            "ram_gb": 8,
            "internal_storage_gb": 256,
            "screen_size": 6.2,
            "display_type_name": "Dynamic AMOLED 2X",
            "battery_capacity": 4000,
            "price_unofficial": 1299.5,
            "price_official": null
        })),
        record(json!({
            "brand_name": "Google",
            "model": "Pixel 8",
            "status": "Available",
            "release_date": "2023-10-04",
            "chipset_name": "Tensor G3",
            "ram_gb": 8,
            "internal_storage_gb": 128,
            "screen_size": 6.2,
            "display_type_name": "",
            "battery_capacity": 4575,
            "price_unofficial": 0,
            "price_official": 699
        })),
    ];

    let table = ComparisonTable::build(&phones);
    assert_eq!(table.headers, vec!["Samsung Galaxy S24", "Google Pixel 8"]);
    assert_eq!(table.rows.len(), 12);
    assert_eq!(table.rows[0].category, "Basic");
    assert_eq!(table.rows[11].category, "Pricing");

    let brand = row(&table, "Brand");
    assert!(brand.differs);

    let model = row(&table, "Model");
    assert!(!model.differs, "model is never highlighted");

    assert!(!row(&table, "Status").differs);
    assert_eq!(row(&table, "Release Date").values, vec!["2024", "2023"]);

    let ram = row(&table, "RAM");
    assert_eq!(ram.values, vec!["8GB", "8GB"]);
    assert!(!ram.differs);
    assert!(row(&table, "Storage").differs);

    assert_eq!(row(&table, "Screen Size").values, vec!["6.2\"", "6.2\""]);
    assert_eq!(row(&table, "Display Type").values, vec!["Dynamic AMOLED 2X", NOT_AVAILABLE]);
    assert_eq!(row(&table, "Battery").values, vec!["4000mAh", "4575mAh"]);
    assert_eq!(row(&table, "Price (Unofficial)").values, vec!["$1,299.50", NOT_AVAILABLE]);
    assert_eq!(row(&table, "Price (Official)").values, vec![NOT_AVAILABLE, "$699"]);
}

#[test]
fn single_phone_never_differs() {
    let phone = record(json!({ "brand_name": "Apple", "model": "iPhone 15" }));
    let table = ComparisonTable::build(&[phone]);
    assert_eq!(table.headers, vec!["Apple iPhone 15"]);
    assert!(table.rows.iter().all(|r| !r.differs));
    assert_eq!(row(&table, "Chipset").values, vec![NOT_AVAILABLE]);
}

#[test]
fn pretty_sql_breaks_clauses_and_conditions() {
    let sql = "SELECT DISTINCT p.phone_id, b.brand_name FROM phones p \
               INNER JOIN brands b ON p.brand_id = b.brand_id \
               WHERE b.brand_name = $1 AND ds.screen_size BETWEEN $2 AND $3 \
               ORDER BY p.phone_id ASC LIMIT 20 OFFSET 0";

    let expected = "SELECT DISTINCT
    p.phone_id,
    b.brand_name
FROM phones p
INNER JOIN brands b ON p.brand_id = b.brand_id
WHERE b.brand_name = $1
    AND ds.screen_size BETWEEN $2 AND $3
ORDER BY p.phone_id ASC
LIMIT 20 OFFSET 0";

    assert_eq!(pretty_sql(sql), expected);
}

#[test]
fn pretty_sql_leaves_parenthesised_groups_alone() {
    let sql = "SELECT COUNT(*) AS total FROM t WHERE (a >= $1 OR b >= $2) AND c = $3";
    let expected = "SELECT
    COUNT(*) AS total
FROM t
WHERE (a >= $1 OR b >= $2)
    AND c = $3";
    assert_eq!(pretty_sql(sql), expected);
}

#[test]
fn pretty_sql_is_stable_on_its_own_output() {
    let once = pretty_sql("select a, b from t where x = $1 or y = $2 order by a desc");
    assert_eq!(pretty_sql(&once), once);
    assert!(once.starts_with(
        "select\n    a,\n    b\nfrom t\nwhere x = $1\n    or y = $2\norder by a desc"
    ));
}
