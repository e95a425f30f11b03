use crate::transport::http::types::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Serialize, Debug, ToSchema)]
pub struct ServiceInfo {
    pub success: bool,
    pub message: String,
    pub version: String,
    pub environment: String,
    /// `"METHOD /path"` -> what it does.
    pub endpoints: BTreeMap<String, String>,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Service description and endpoint listing", body = ServiceInfo)
    )
)]
pub async fn service_info_handler(State(state): State<AppState>) -> Json<ServiceInfo> {
    let endpoints = [
        ("GET /health", "Liveness and pool statistics"),
        ("GET /api/devices", "Get all devices with pagination"),
        ("GET /api/devices/filters", "Get filter options"),
        ("POST /api/devices/search", "Search devices with filters"),
        ("GET /api/devices/:id", "Get device details by ID"),
    ]
    .into_iter()
    .map(|(route, what)| (route.to_string(), what.to_string()))
    .collect();

    Json(ServiceInfo {
        success: true,
        message: "Mobile Phone Catalog API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.as_str().to_string(),
        endpoints,
        timestamp: Utc::now().to_rfc3339(),
    })
}
