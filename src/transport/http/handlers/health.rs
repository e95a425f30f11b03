use crate::storage::database::PoolStats;
use crate::transport::http::types::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: String,
    /// Round trip of the probe, in milliseconds.
    pub response_time: f64,
    pub pool: PoolStats,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ServerHealth {
    pub status: String,
    /// Seconds since the router was built.
    pub uptime: f64,
    pub version: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct Services {
    pub database: DatabaseHealth,
    pub server: ServerHealth,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub services: Services,
    pub timestamp: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct UnhealthyResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub error: String,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = UnhealthyResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.catalog.database();

    match db.ping().await {
        Ok(response_time) => (
            StatusCode::OK,
            Json(HealthResponse {
                success: true,
                status: "OK".to_string(),
                message: "Service is healthy".to_string(),
                services: Services {
                    database: DatabaseHealth {
                        status: "connected".to_string(),
                        response_time,
                        pool: db.pool_stats(),
                    },
                    server: ServerHealth {
                        status: "running".to_string(),
                        uptime: state.started_at.elapsed().as_secs_f64(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                },
                timestamp: Utc::now().to_rfc3339(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            let detail = if state.config.environment.is_development() {
                e.to_string()
            } else {
                e.public_message()
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse {
                    success: false,
                    status: "ERROR".to_string(),
                    message: "Service is unhealthy".to_string(),
                    error: detail,
                    timestamp: Utc::now().to_rfc3339(),
                }),
            )
                .into_response()
        }
    }
}
