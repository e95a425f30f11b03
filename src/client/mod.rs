//! HTTP client for the catalog API.
//!
//! Reads are retried with a fixed backoff schedule when the failure is
//! transient (timeouts, connection failures, 408, 429 and 5xx). Any other
//! 4xx, and any body that cannot be decoded, fails immediately.

pub mod pretty_sql;

pub use pretty_sql::pretty_sql;

use crate::app::catalog_service::{DeviceList, SearchResult};
use crate::domain::catalog::FilterOptions;
use crate::domain::filter::FilterCriteria;
use crate::domain::query::SortOrder;
use crate::transport::http::types::{ErrorResponse, PhoneDetail};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_millis(1000),
    Duration::from_millis(2000),
    Duration::from_millis(4000),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    /// HTTP status, when a response was received at all.
    pub status: Option<u16>,
}

impl ClientError {
    fn new(code: &str, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            status,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self.status {
            Some(status) => status == 408 || status == 429 || status >= 500,
            None => self.code == "TIMEOUT_ERROR" || self.code == "NETWORK_ERROR",
        }
    }
}

/// The success envelope as received.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub execution_time: Option<f64>,
}

/// Search body as the client sends it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub filters: FilterCriteria,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    retry_delays: Vec<Duration>,
}

impl CatalogClient {
    /// Client with the default 30 s timeout and 1 s / 2 s / 4 s backoff.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, DEFAULT_TIMEOUT, DEFAULT_RETRY_DELAYS.to_vec())
    }

    /// One retry per entry in `retry_delays`, waiting that long first.
    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Duration,
        retry_delays: Vec<Duration>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::new("UNKNOWN_ERROR", e.to_string(), None))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_delays,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_devices(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Envelope<DeviceList>, ClientError> {
        let url = format!("{}/api/devices", self.base_url);
        self.send(|| {
            self.http
                .get(&url)
                .query(&[("page", page.to_string()), ("limit", limit.to_string())])
        })
        .await
    }

    pub async fn search_phones(
        &self,
        query: &SearchQuery,
    ) -> Result<Envelope<SearchResult>, ClientError> {
        let url = format!("{}/api/devices/search", self.base_url);
        self.send(|| self.http.post(&url).json(query)).await
    }

    pub async fn phone_details(&self, phone_id: i64) -> Result<Envelope<PhoneDetail>, ClientError> {
        let url = format!("{}/api/devices/{}", self.base_url, phone_id);
        self.send(|| self.http.get(&url)).await
    }

    pub async fn filter_options(&self) -> Result<Envelope<FilterOptions>, ClientError> {
        let url = format!("{}/api/devices/filters", self.base_url);
        self.send(|| self.http.get(&url)).await
    }

    /// Raw health document; a 503 comes back as `SERVER_ERROR` after retries.
    pub async fn health(&self) -> Result<JsonValue, ClientError> {
        let url = format!("{}/health", self.base_url);
        self.send(|| self.http.get(&url)).await
    }

    async fn send<T, F>(&self, build: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.attempt::<T>(build()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry_delays.len() => {
                    let delay = self.retry_delays[attempt];
                    attempt += 1;
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            return serde_json::from_slice::<T>(&body).map_err(|e| {
                ClientError::new(
                    "UNKNOWN_ERROR",
                    format!("Unexpected response body: {}", e),
                    Some(status.as_u16()),
                )
            });
        }

        let server_error = serde_json::from_slice::<ErrorResponse>(&body).ok();
        Err(status_error(status, server_error))
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::new("TIMEOUT_ERROR", "Request timed out", None)
    } else if e.is_connect() || e.is_request() || e.is_body() {
        ClientError::new("NETWORK_ERROR", format!("Network error: {}", e), None)
    } else {
        ClientError::new("UNKNOWN_ERROR", e.to_string(), None)
    }
}

fn status_error(status: StatusCode, server: Option<ErrorResponse>) -> ClientError {
    let fallback_code = match status.as_u16() {
        404 => "NOT_FOUND",
        408 => "TIMEOUT_ERROR",
        429 => "RATE_LIMITED",
        s if s >= 500 => "SERVER_ERROR",
        _ => "UNKNOWN_ERROR",
    };
    match server {
        Some(body) => ClientError {
            code: body.error.code,
            message: body.error.message,
            status: Some(status.as_u16()),
        },
        None => ClientError::new(
            fallback_code,
            format!("HTTP {}", status),
            Some(status.as_u16()),
        ),
    }
}
