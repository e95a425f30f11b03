//! Client retry behaviour against a stub API that fails on purpose.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use phone_catalog::{CatalogClient, ClientError};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Hits = Arc<AtomicUsize>;

async fn flaky_filters(State(hits): State<Hits>) -> Response {
    let n = hits.fetch_add(1, Ordering::SeqCst);
    if n < 2 {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }
    Json(json!({
        "success": true,
        "data": {
            "brands": [{ "brand_id": 1, "brand_name": "Samsung" }],
            "chipsets": [],
            "displayTypes": [],
            "storageOptions": [128, 256],
            "priceRange": { "min": 199.0, "max": 1299.0 }
        },
        "sqlQuery": "SELECT 1",
        "executionTime": 1.5
    }))
    .into_response()
}

async fn missing_phone(State(hits): State<Hits>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": {
                "code": "NOT_FOUND",
                "message": "Phone with ID 999 not found",
                "status": 404
            }
        })),
    )
        .into_response()
}

async fn always_500(State(hits): State<Hits>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn garbage(State(hits): State<Hits>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, "<html>not json</html>").into_response()
}

async fn slow(State(hits): State<Hits>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "success": true })).into_response()
}

async fn spawn_stub(router: Router<Hits>) -> Result<(String, Hits), Box<dyn std::error::Error>> {
    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let router = router.with_state(hits.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok((format!("http://127.0.0.1:{}", port), hits))
}

fn fast_client(base: &str) -> Result<CatalogClient, ClientError> {
    CatalogClient::with_options(
        base,
        Duration::from_secs(5),
        vec![Duration::from_millis(10); 3],
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_transient_failures_are_retried() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::new().route("/api/devices/filters", get(flaky_filters));
    let (base, hits) = spawn_stub(router).await?;
    let client = fast_client(&base)?;

    let res = client.filter_options().await?;
    assert!(res.success);
    assert_eq!(res.data.brands[0].brand_name, "Samsung");
    assert_eq!(res.data.storage_options, vec![128, 256]);
    assert_eq!(res.sql_query.as_deref(), Some("SELECT 1"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_not_found_is_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::new().route("/api/devices/:id", get(missing_phone));
    let (base, hits) = spawn_stub(router).await?;
    let client = fast_client(&base)?;

    let err = client.phone_details(999).await.unwrap_err();
    assert_eq!(err.code, "NOT_FOUND");
    assert_eq!(err.message, "Phone with ID 999 not found");
    assert_eq!(err.status, Some(404));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_persistent_server_errors_give_up() -> Result<(), Box<dyn std::error::Error>> {
    let (base, hits) = spawn_stub(Router::new().route("/health", get(always_500))).await?;
    let client = fast_client(&base)?;

    let err = client.health().await.unwrap_err();
    assert_eq!(err.code, "SERVER_ERROR");
    assert_eq!(err.status, Some(500));
    // One attempt plus one per backoff step.
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_undecodable_body_fails_once() -> Result<(), Box<dyn std::error::Error>> {
    let (base, hits) = spawn_stub(Router::new().route("/health", get(garbage))).await?;
    let client = fast_client(&base)?;

    let err = client.health().await.unwrap_err();
    assert_eq!(err.code, "UNKNOWN_ERROR");
    assert!(!err.is_retryable());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timeouts_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let (base, hits) = spawn_stub(Router::new().route("/health", get(slow))).await?;
    let client = CatalogClient::with_options(
        &base,
        Duration::from_millis(200),
        vec![Duration::from_millis(10)],
    )?;

    let err = client.health().await.unwrap_err();
    assert_eq!(err.code, "TIMEOUT_ERROR");
    assert_eq!(err.status, None);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connection_refused_is_a_network_error() -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);

    let client = fast_client(&format!("http://127.0.0.1:{}/", port))?;
    assert_eq!(client.base_url(), format!("http://127.0.0.1:{}", port));

    let err = client.list_devices(1, 20).await.unwrap_err();
    assert_eq!(err.code, "NETWORK_ERROR");
    assert!(err.is_retryable());
    Ok(())
}

#[test]
fn retryable_classification() {
    let with_status = |status: u16| ClientError {
        code: "X".to_string(),
        message: String::new(),
        status: Some(status),
    };
    for status in [408, 429, 500, 502, 503, 504] {
        assert!(with_status(status).is_retryable(), "{}", status);
    }
    for status in [400, 401, 403, 404, 422] {
        assert!(!with_status(status).is_retryable(), "{}", status);
    }

    let no_status = |code: &str| ClientError {
        code: code.to_string(),
        message: String::new(),
        status: None,
    };
    assert!(no_status("TIMEOUT_ERROR").is_retryable());
    assert!(no_status("NETWORK_ERROR").is_retryable());
    assert!(!no_status("UNKNOWN_ERROR").is_retryable());
}
