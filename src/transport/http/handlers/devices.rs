use crate::app::catalog_service::{DeviceList, SearchResult};
use crate::domain::catalog::FilterOptions;
use crate::domain::query::SortSpec;
use crate::error::AppError;
use crate::transport::http::types::{
    invalid_json, ApiError, ApiResponse, AppState, ListParams, PhoneDetail, SearchRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/devices",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 100")
    ),
    responses(
        (status = 200, description = "One page of the unfiltered catalog", body = DeviceList),
        (status = 400, description = "Page or limit below 1", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn list_devices_handler(
    State(state): State<AppState>,
    params: Option<Query<ListParams>>,
) -> Result<ApiResponse<DeviceList>, ApiError> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let (page, limit) = params.resolve().map_err(|e| state.fail(e))?;
    let result = state
        .catalog
        .list_devices(page, limit)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(result.into())
}

#[utoipa::path(
    post,
    path = "/api/devices/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Page of matching phones", body = SearchResult),
        (status = 400, description = "Bad JSON, page, limit or sortOrder", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn search_devices_handler(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<ApiResponse<SearchResult>, ApiError> {
    let Json(request) = body.map_err(|e| state.fail(invalid_json(e)))?;
    let valid = request.validate().map_err(|e| state.fail(e))?;

    let criteria = request
        .filters
        .as_ref()
        .map(|f| f.normalize())
        .unwrap_or_default();
    let sort = SortSpec::new(request.sort_by.clone(), valid.sort_order);

    let result = state
        .catalog
        .search(criteria, sort, valid.page, valid.limit)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(result.into())
}

#[utoipa::path(
    get,
    path = "/api/devices/filters",
    responses(
        (status = 200, description = "Filter values currently in use", body = FilterOptions),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn filter_options_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<FilterOptions>, ApiError> {
    let result = state
        .catalog
        .filter_options()
        .await
        .map_err(|e| state.fail(e))?;
    Ok(result.into())
}

#[utoipa::path(
    get,
    path = "/api/devices/{id}",
    params(("id" = i64, Path, description = "Phone id")),
    responses(
        (status = 200, description = "Phone record with colors and pricing", body = PhoneDetail),
        (status = 400, description = "Id is not a positive integer", body = ErrorResponse),
        (status = 404, description = "No phone with this id", body = ErrorResponse)
    )
)]
pub async fn device_details_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<PhoneDetail>, ApiError> {
    let phone_id = id
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| state.fail(AppError::validation("Phone ID must be a positive integer")))?;

    let result = state
        .catalog
        .phone_details(phone_id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiResponse {
        success: true,
        data: PhoneDetail { phone: result.data },
        sql_query: Some(result.sql_query),
        execution_time: Some(result.execution_time),
    })
}
