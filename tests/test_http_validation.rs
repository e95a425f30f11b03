//! Request validation and error envelopes over real HTTP.
//!
//! The pool points at a closed port and is never touched by rejected requests,
//! so these tests run without a database.

use phone_catalog::infra::config::{Config, DatabaseConfig, Environment};
use phone_catalog::transport::http::{create_router, AppState};
use phone_catalog::{CatalogService, Database};
use serde_json::{json, Value};
use std::time::Duration;

async fn spawn_api() -> Result<String, Box<dyn std::error::Error>> {
    let config = Config {
        database: DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            acquire_timeout: Duration::from_secs(1),
            max_connections: 2,
            ..DatabaseConfig::default()
        },
        environment: Environment::Test,
        ..Config::default()
    };
    let db = Database::connect_lazy(&config.database)?;
    let router = create_router(AppState::new(CatalogService::new(db), config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

async fn get_json(url: &str) -> Result<(u16, Value), Box<dyn std::error::Error>> {
    let resp = reqwest::get(url).await?;
    let status = resp.status().as_u16();
    Ok((status, resp.json().await?))
}

async fn post_json(url: &str, body: Value) -> Result<(u16, Value), Box<dyn std::error::Error>> {
    let resp = reqwest::Client::new().post(url).json(&body).send().await?;
    let status = resp.status().as_u16();
    Ok((status, resp.json().await?))
}

fn assert_error(body: &Value, status: u16, code: &str) {
    assert_eq!(body["success"], json!(false), "{}", body);
    assert_eq!(body["error"]["status"], json!(status), "{}", body);
    assert_eq!(body["error"]["code"], json!(code), "{}", body);
    assert!(body["error"].get("timestamp").is_none(), "timestamp outside development: {}", body);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_rejects_non_positive_page_and_limit() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    let (status, body) = get_json(&format!("{}/api/devices?page=0", base)).await?;
    assert_eq!(status, 400);
    assert_error(&body, 400, "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], json!("Page must be greater than 0"));

    let (status, body) = get_json(&format!("{}/api/devices?page=2&limit=-3", base)).await?;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["message"], json!("Limit must be greater than 0"));

    println!("list validation ok");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_detail_rejects_bad_ids() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    for id in ["abc", "0", "-4", "1.5"] {
        let (status, body) = get_json(&format!("{}/api/devices/{}", base, id)).await?;
        assert_eq!(status, 400, "id {:?}", id);
        assert_error(&body, 400, "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], json!("Phone ID must be a positive integer"));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_validation_lists_every_problem() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;
    let url = format!("{}/api/devices/search", base);

    let (status, body) = post_json(
        &url,
        json!({
            "page": 0,
            "limit": 500,
            "sortOrder": "sideways",
            "filters": { "brand": "Apple" }
        }),
    )
    .await?;
    assert_eq!(status, 400);
    assert_error(&body, 400, "VALIDATION_ERROR");

    let details = body["error"]["details"].as_array().cloned().unwrap_or_default();
    let fields: Vec<&str> = details.iter().filter_map(|d| d["field"].as_str()).collect();
    assert_eq!(fields, vec!["page", "limit", "sortOrder"]);

    let (status, body) = post_json(&url, json!({ "page": "two" })).await?;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["details"][0]["field"], json!("page"));

    let (status, body) = post_json(&url, json!({ "limit": 2.5 })).await?;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["details"][0]["field"], json!("limit"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_rejects_malformed_json() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/devices/search", base))
        .header("content-type", "application/json")
        .body("{\"filters\": {")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_error(&body, 400, "INVALID_JSON");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_route_lists_endpoints() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    let (status, body) = get_json(&format!("{}/api/phones", base)).await?;
    assert_eq!(status, 404);
    assert_error(&body, 404, "ROUTE_NOT_FOUND");
    assert_eq!(body["error"]["message"], json!("Route GET /api/phones not found"));
    let endpoints = body["error"]["availableEndpoints"].as_array().cloned().unwrap_or_default();
    assert!(endpoints.contains(&json!("POST /api/devices/search")), "{}", body);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wrong_method_keeps_the_error_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    let (status, body) = get_json(&format!("{}/api/devices/search", base)).await?;
    println!("GET /api/devices/search -> {} {}", status, body);
    assert_eq!(status, 405);
    assert_error(&body, 405, "METHOD_NOT_ALLOWED");
    assert_eq!(body["error"]["message"], json!("Method GET not allowed on /api/devices/search"));
    let endpoints = body["error"]["availableEndpoints"].as_array().cloned().unwrap_or_default();
    assert!(endpoints.contains(&json!("POST /api/devices/search")), "{}", body);

    let resp = reqwest::Client::new()
        .delete(format!("{}/api/devices/1", base))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 405);
    let body: Value = resp.json().await?;
    assert_error(&body, 405, "METHOD_NOT_ALLOWED");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_info_needs_no_database() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    for path in ["/", "/api"] {
        let (status, body) = get_json(&format!("{}{}", base, path)).await?;
        assert_eq!(status, 200);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("Mobile Phone Catalog API"));
        assert_eq!(body["environment"], json!("test"));
        assert!(body["endpoints"].get("GET /api/devices/:id").is_some(), "{}", body);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_database_is_503() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_api().await?;

    let (status, body) = get_json(&format!("{}/api/devices", base)).await?;
    assert_eq!(status, 503);
    assert_error(&body, 503, "DATABASE_CONNECTION_ERROR");
    assert_eq!(body["error"]["message"], json!("Database connection failed"));
    assert!(body["error"].get("details").is_none(), "driver text leaked: {}", body);

    let (status, body) = get_json(&format!("{}/health", base)).await?;
    assert_eq!(status, 503);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!("ERROR"));

    Ok(())
}
