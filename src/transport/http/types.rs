use crate::app::catalog_service::{CatalogService, Timed};
use crate::domain::filter::SearchFilters;
use crate::domain::query::{SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::AppError;
use crate::infra::config::Config;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use utoipa::ToSchema;

pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /api",
    "GET /api/devices",
    "GET /api/devices/filters",
    "POST /api/devices/search",
    "GET /api/devices/:id",
];

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(catalog: CatalogService, config: Config) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Wraps `err` for the HTTP layer, releasing internal detail only in
    /// development.
    pub fn fail(&self, err: AppError) -> ApiError {
        ApiError {
            error: err,
            expose_internal: self.config.environment.is_development(),
        }
    }
}

/// Success envelope. `sqlQuery` and `executionTime` describe the statement
/// that produced `data`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

impl<T> From<Timed<T>> for ApiResponse<T> {
    fn from(timed: Timed<T>) -> Self {
        Self {
            success: true,
            data: timed.data,
            sql_query: Some(timed.sql_query),
            execution_time: Some(timed.execution_time),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PhoneDetail {
    #[schema(value_type = Object)]
    pub phone: JsonValue,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

/// An [`AppError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub expose_internal: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            error!(code = self.error.code(), error = %self.error, "Request failed");
        } else {
            warn!(code = self.error.code(), error = %self.error, "Request rejected");
        }

        let available_endpoints = match self.error {
            AppError::RouteNotFound { .. } | AppError::MethodNotAllowed { .. } => {
                Some(AVAILABLE_ENDPOINTS.iter().map(|e| e.to_string()).collect())
            }
            _ => None,
        };
        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.error.code().to_string(),
                message: self.error.public_message(),
                status: status.as_u16(),
                details: self.error.details(self.expose_internal),
                available_endpoints,
                timestamp: self.expose_internal.then(|| Utc::now().to_rfc3339()),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Body of `POST /api/devices/search`. Page, limit and sort order are kept
/// raw here and checked by [`SearchRequest::validate`].
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: Option<SearchFilters>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub page: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub limit: Option<JsonValue>,
}

/// A search request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSearch {
    pub page: i64,
    pub limit: i64,
    pub sort_order: SortOrder,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<ValidSearch, AppError> {
        let mut problems = Vec::new();

        let page = match strict_int(self.page.as_ref()) {
            Ok(None) => 1,
            Ok(Some(n)) if n >= 1 => n,
            _ => {
                problems.push(json!({"field": "page", "message": "page must be an integer >= 1"}));
                1
            }
        };
        let limit = match strict_int(self.limit.as_ref()) {
            Ok(None) => DEFAULT_PAGE_SIZE,
            Ok(Some(n)) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
            _ => {
                problems.push(json!({
                    "field": "limit",
                    "message": format!("limit must be an integer between 1 and {}", MAX_PAGE_SIZE)
                }));
                DEFAULT_PAGE_SIZE
            }
        };
        let sort_order = match self.sort_order.as_deref() {
            None => SortOrder::Asc,
            Some(raw) => match SortOrder::parse(raw) {
                Some(order) => order,
                None => {
                    problems.push(json!({
                        "field": "sortOrder",
                        "message": "sortOrder must be 'asc' or 'desc'"
                    }));
                    SortOrder::Asc
                }
            },
        };

        if problems.is_empty() {
            Ok(ValidSearch {
                page,
                limit,
                sort_order,
            })
        } else {
            Err(AppError::Validation {
                message: "Invalid search request".to_string(),
                details: Some(JsonValue::Array(problems)),
            })
        }
    }
}

/// `None` for absent/null, the integer for JSON integers and integer
/// strings, `Err` for anything else.
fn strict_int(value: Option<&JsonValue>) -> Result<Option<i64>, ()> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n.as_i64().map(Some).ok_or(()),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| ()),
        Some(_) => Err(()),
    }
}

/// Query string of `GET /api/devices`. Values stay raw so that junk falls
/// back to defaults instead of failing extraction.
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// Non-numeric values fall back to the defaults; `page < 1` and
    /// `limit < 1` are rejected; `limit` above the maximum is clamped.
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let page = lenient_int(self.page.as_deref()).unwrap_or(1);
        let limit = lenient_int(self.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(AppError::validation("Page must be greater than 0"));
        }
        if limit < 1 {
            return Err(AppError::validation("Limit must be greater than 0"));
        }
        Ok((page, limit.min(MAX_PAGE_SIZE)))
    }
}

// Leading-integer parse: "3abc" -> 3, "abc" -> None.
fn lenient_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let end = raw
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    raw[..end].parse().ok()
}

pub fn invalid_json(err: JsonRejection) -> AppError {
    AppError::InvalidJson(err.body_text())
}
