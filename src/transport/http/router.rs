use crate::app::catalog_service::{DeviceList, SearchResult, Sorting};
use crate::domain::catalog::{
    BrandOption, ChipsetOption, DisplayTypeOption, FilterOptions, Pagination, PhoneStatus,
    PhoneSummary, PriceRange, PricingVariant,
};
use crate::domain::filter::{FilterCriteria, NumericRange, RangeInput, SearchFilters};
use crate::error::AppError;
use crate::storage::database::PoolStats;
use crate::transport::http::handlers::health::{
    DatabaseHealth, HealthResponse, ServerHealth, Services, UnhealthyResponse,
};
use crate::transport::http::handlers::info::ServiceInfo;
use crate::transport::http::handlers::{devices, health, info};
use crate::transport::http::middleware::log_requests;
use crate::transport::http::types::{
    ApiError, AppState, ErrorBody, ErrorResponse, PhoneDetail, SearchRequest,
};
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::routing::{get, post};
use axum::{middleware, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        info::service_info_handler,
        devices::list_devices_handler,
        devices::filter_options_handler,
        devices::search_devices_handler,
        devices::device_details_handler
    ),
    components(schemas(
        SearchRequest,
        SearchFilters,
        RangeInput,
        FilterCriteria,
        NumericRange,
        DeviceList,
        SearchResult,
        Sorting,
        PhoneSummary,
        PhoneStatus,
        PhoneDetail,
        PricingVariant,
        Pagination,
        FilterOptions,
        BrandOption,
        ChipsetOption,
        DisplayTypeOption,
        PriceRange,
        ErrorResponse,
        ErrorBody,
        HealthResponse,
        UnhealthyResponse,
        Services,
        DatabaseHealth,
        ServerHealth,
        PoolStats,
        ServiceInfo
    ))
)]
pub struct ApiDoc;

/// `/api/devices/filters` is registered as a static segment, so it always
/// wins over `/api/devices/:id`. The method fallback only covers routes
/// added before it.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(info::service_info_handler))
        .route("/api", get(info::service_info_handler))
        .route("/health", get(health::healthcheck_handler))
        .route("/api/devices", get(devices::list_devices_handler))
        .route("/api/devices/filters", get(devices::filter_options_handler))
        .route("/api/devices/search", post(devices::search_devices_handler))
        .route("/api/devices/:id", get(devices::device_details_handler))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(app_state)
}

async fn route_not_found(State(state): State<AppState>, method: Method, uri: Uri) -> ApiError {
    state.fail(AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    })
}

async fn method_not_allowed(State(state): State<AppState>, method: Method, uri: Uri) -> ApiError {
    state.fail(AppError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    })
}
