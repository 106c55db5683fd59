//! POS sales API client.
//!
//! Wraps the four endpoints the dashboard consumes. Every response is checked
//! against the shape the dashboard expects before any record reaches the
//! analytics code; an unrecognised body is an [`ApiError::UnexpectedShape`],
//! never a silently empty list.
//!
//! The `try_*` methods report failures. The plain `fetch_*` methods keep the
//! dashboard's fail-safe contract: log the error and return an empty default.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::config::DashboardConfig;
use crate::data_helpers::value_str;
use crate::models::{CustomerHistory, CustomerRecord, SaleRecord};

const SALES_PATH: &str = "/api/sales/create";
const CUSTOMERS_PATH: &str = "/api/customers";
const HISTORY_PATH: &str = "/api/sales/history/";
const LOGIN_PATH: &str = "/api/login/";

const LOGIN_REJECTED: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot reach the sales server at {url}")]
    Unreachable { url: String },
    #[error("Connection to {url} timed out")]
    Timeout { url: String },
    #[error("Invalid sales server URL: {url}")]
    InvalidUrl { url: String },
    #[error("Network error communicating with {url}: {message}")]
    Network { url: String, message: String },
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("Invalid JSON from {path}: {message}")]
    InvalidJson { path: String, message: String },
    #[error("Unexpected response from {path}: {detail}")]
    UnexpectedShape { path: String, detail: String },
    #[error("Please enter both email and password")]
    MissingCredentials,
    #[error("{0}")]
    LoginRejected(String),
}

/// Convert a `reqwest::Error` into a user-friendly error.
fn friendly_error(url: &str, err: &reqwest::Error) -> ApiError {
    let url = url.to_string();
    if err.is_connect() {
        return ApiError::Unreachable { url };
    }
    if err.is_timeout() {
        return ApiError::Timeout { url };
    }
    if err.is_builder() {
        return ApiError::InvalidUrl { url };
    }
    ApiError::Network {
        url,
        message: err.to_string(),
    }
}

/// Convert an HTTP status code into a user-friendly message.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Not signed in or session expired".to_string(),
        403 => "Not authorized to view this data".to_string(),
        404 => "Sales server endpoint not found".to_string(),
        s if s >= 500 => "Sales server error".to_string(),
        _ => "Unexpected response from sales server".to_string(),
    }
}

fn unexpected_shape(path: &str, detail: impl Into<String>) -> ApiError {
    ApiError::UnexpectedShape {
        path: path.to_string(),
        detail: detail.into(),
    }
}

// ---------------------------------------------------------------------------
// Response validation
// ---------------------------------------------------------------------------

/// Decode `{ "sales": [...] }`. Elements that are not sale objects are
/// dropped with a warning; the rest of the list survives.
pub fn parse_sales_response(body: Value) -> Result<Vec<SaleRecord>, ApiError> {
    let Value::Object(mut obj) = body else {
        return Err(unexpected_shape(SALES_PATH, "expected an object with a `sales` array"));
    };
    let Some(Value::Array(rows)) = obj.remove("sales") else {
        return Err(unexpected_shape(SALES_PATH, "missing `sales` array"));
    };

    let total = rows.len();
    let sales: Vec<SaleRecord> = rows
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|row| match serde_json::from_value::<SaleRecord>(row) {
            Ok(sale) => Some(sale),
            Err(e) => {
                debug!(error = %e, "skipping undecodable sale record");
                None
            }
        })
        .collect();
    if sales.len() != total {
        warn!(
            dropped = total - sales.len(),
            total, "sales response contained malformed records"
        );
    }
    Ok(sales)
}

/// Decode a bare `[...]` customer list.
pub fn parse_customers_response(body: Value) -> Result<Vec<CustomerRecord>, ApiError> {
    let Value::Array(rows) = body else {
        return Err(unexpected_shape(CUSTOMERS_PATH, "expected an array of customers"));
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<CustomerRecord>(row).ok())
        .collect())
}

/// Decode `{ "customer": {...}, "history": [...] }`.
pub fn parse_history_response(body: Value) -> Result<CustomerHistory, ApiError> {
    if !body.get("customer").map(Value::is_object).unwrap_or(false) {
        return Err(unexpected_shape(HISTORY_PATH, "missing `customer` object"));
    }
    serde_json::from_value::<CustomerHistory>(body)
        .map_err(|e| unexpected_shape(HISTORY_PATH, e.to_string()))
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Staff login body. The password is wiped from memory on drop.
#[derive(Serialize)]
pub struct LoginRequest {
    pub emp_email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(emp_email: &str, password: &str) -> Self {
        Self {
            emp_email: emp_email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("emp_email", &self.emp_email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Drop for LoginRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_url: String,
    auth_url: String,
}

impl ApiClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network {
                url: config.api_url.clone(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            auth_url: config.auth_url.clone(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let full_url = format!("{}{path}", self.api_url);
        let resp = self
            .http
            .get(&full_url)
            .query(query)
            .send()
            .await
            .map_err(|e| friendly_error(&self.api_url, &e))?;
        let status = resp.status();
        let body_text = resp
            .text()
            .await
            .map_err(|e| friendly_error(&self.api_url, &e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|json| value_str(&json, &["error", "message", "detail"]))
                .unwrap_or_else(|| status_message(status));
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body_text).map_err(|e| ApiError::InvalidJson {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn try_fetch_sales(&self) -> Result<Vec<SaleRecord>, ApiError> {
        let body = self.get_json(SALES_PATH, &[]).await?;
        let sales = parse_sales_response(body)?;
        debug!(count = sales.len(), "fetched sales");
        Ok(sales)
    }

    pub async fn try_fetch_customers(&self) -> Result<Vec<CustomerRecord>, ApiError> {
        let body = self.get_json(CUSTOMERS_PATH, &[]).await?;
        let customers = parse_customers_response(body)?;
        debug!(count = customers.len(), "fetched customers");
        Ok(customers)
    }

    pub async fn try_fetch_customer_history(
        &self,
        phone: &str,
    ) -> Result<CustomerHistory, ApiError> {
        let body = self.get_json(HISTORY_PATH, &[("phone", phone)]).await?;
        parse_history_response(body)
    }

    /// Sales list, or an empty list on any failure.
    pub async fn fetch_sales(&self) -> Vec<SaleRecord> {
        self.try_fetch_sales().await.unwrap_or_else(|e| {
            warn!(error = %e, "Error fetching sales data");
            Vec::new()
        })
    }

    /// Customer list, or an empty list on any failure.
    pub async fn fetch_customers(&self) -> Vec<CustomerRecord> {
        self.try_fetch_customers().await.unwrap_or_else(|e| {
            warn!(error = %e, "Error fetching customer data");
            Vec::new()
        })
    }

    /// Sales history for `phone`, or an "Unknown" placeholder on failure.
    pub async fn fetch_customer_history(&self, phone: &str) -> CustomerHistory {
        self.try_fetch_customer_history(phone)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Error fetching customer sales history");
                CustomerHistory::unknown(phone)
            })
    }

    /// Staff login. Any 2xx with a JSON body is a success; the body is
    /// returned as-is.
    pub async fn login(&self, request: &LoginRequest) -> Result<Value, ApiError> {
        if request.emp_email.is_empty() || request.password.is_empty() {
            return Err(ApiError::MissingCredentials);
        }

        let full_url = format!("{}{LOGIN_PATH}", self.auth_url);
        let resp = self
            .http
            .post(&full_url)
            .json(request)
            .send()
            .await
            .map_err(|e| friendly_error(&self.auth_url, &e))?;
        let status = resp.status();
        let body_text = resp
            .text()
            .await
            .map_err(|e| friendly_error(&self.auth_url, &e))?;
        let body = serde_json::from_str::<Value>(&body_text);

        if !status.is_success() {
            let message = body
                .ok()
                .and_then(|json| value_str(&json, &["error"]))
                .unwrap_or_else(|| LOGIN_REJECTED.to_string());
            warn!(status = status.as_u16(), "login rejected");
            return Err(ApiError::LoginRejected(message));
        }

        let body = body.map_err(|e| ApiError::InvalidJson {
            path: LOGIN_PATH.to_string(),
            message: e.to_string(),
        })?;
        info!(email = %request.emp_email, "login successful");
        Ok(body)
    }
}
