//! Ordering server API client.
//!
//! `OrderApi` is the seam between the synchronizer/pollers and the HTTP
//! server; `HttpOrderApi` is the reqwest implementation used in production.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DeskConfig;
use crate::error::{DeskError, DeskResult};
use crate::models::{
    ActionResponse, ApproveResponse, Availability, AvailabilityResponse, Notification,
    ServeResponse, StockTarget, TrackerSnapshot, TrackerStage,
};

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the server base URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a client error with a readable message.
fn transport_error(url: &str, err: &reqwest::Error, timeout: Duration) -> DeskError {
    if err.is_timeout() {
        return DeskError::Timeout(timeout.as_secs());
    }
    if err.is_connect() {
        return DeskError::Network(format!("Cannot reach server at {url}"));
    }
    if err.is_builder() {
        return DeskError::Network(format!("Invalid server URL: {url}"));
    }
    DeskError::Network(format!("Network error communicating with {url}: {err}"))
}

/// Build the error for a non-2xx response, keeping the server's own
/// `message`/`error` text or a short plain-text body. Empty bodies and HTML
/// error pages carry no message. A JSON body with `success: false` is the
/// server refusing the action, so it keeps its `details` as well.
pub(crate) fn http_error(status: StatusCode, body_text: &str) -> DeskError {
    let trimmed = body_text.trim();
    let message = match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => {
            let text = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_string);
            let message = text("message").or_else(|| text("error"));
            if json.get("success").and_then(Value::as_bool) == Some(false) {
                return DeskError::Rejected {
                    message,
                    details: text("details"),
                };
            }
            message
        }
        Err(_) if trimmed.is_empty() || trimmed.starts_with('<') => None,
        Err(_) => Some(trimmed.to_string()),
    };
    DeskError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Turn `success: false` into an error carrying the server message.
pub(crate) fn require_success(
    success: bool,
    message: Option<String>,
    details: Option<String>,
) -> DeskResult<()> {
    if success {
        Ok(())
    } else {
        Err(DeskError::Rejected { message, details })
    }
}

// ---------------------------------------------------------------------------
// API trait
// ---------------------------------------------------------------------------

/// Server operations used by the client.
///
/// Implementations return `Err(DeskError::Rejected)` for 2xx bodies that
/// carry `success: false`, so callers only see successful payloads in `Ok`.
#[async_trait]
pub trait OrderApi: Send + Sync + 'static {
    async fn update_availability(
        &self,
        food: &str,
        status: Availability,
    ) -> DeskResult<AvailabilityResponse>;

    async fn update_stock(&self, target: &StockTarget, new_stock: i64) -> DeskResult<()>;

    async fn food_stock(&self) -> DeskResult<HashMap<String, i64>>;

    async fn check_notifications(&self) -> DeskResult<Vec<Notification>>;

    async fn mark_notification_read(&self, notification_id: i64) -> DeskResult<()>;

    async fn user_orders(&self) -> DeskResult<Vec<TrackerSnapshot>>;

    async fn update_order_status(
        &self,
        order_id: i64,
        stage: TrackerStage,
    ) -> DeskResult<ActionResponse>;

    async fn approve_order(&self, order_id: i64) -> DeskResult<ApproveResponse>;

    async fn reject_order(&self, order_id: i64) -> DeskResult<ActionResponse>;

    async fn mark_order_served(&self, order_id: i64) -> DeskResult<ServeResponse>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpOrderApi {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
    timeout: Duration,
}

impl HttpOrderApi {
    pub fn new(config: &DeskConfig) -> DeskResult<Self> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url),
            session_cookie: config
                .session_cookie
                .clone()
                .filter(|c| !c.trim().is_empty()),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.client.request(method, url);
        if let Some(cookie) = &self.session_cookie {
            req = req.header(reqwest::header::COOKIE, cookie);
        }
        req
    }

    /// Send a request and return the raw body of a 2xx response.
    async fn send(&self, req: RequestBuilder, path: &str) -> DeskResult<String> {
        let resp = req
            .send()
            .await
            .map_err(|e| transport_error(&self.base_url, &e, self.timeout))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(path, status = status.as_u16(), "request failed");
            return Err(http_error(status, &body_text));
        }
        debug!(path, status = status.as_u16(), "request ok");
        Ok(body_text)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        path: &str,
    ) -> DeskResult<T> {
        let body_text = self.send(req, path).await?;
        serde_json::from_str(&body_text)
            .map_err(|e| DeskError::InvalidResponse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn update_availability(
        &self,
        food: &str,
        status: Availability,
    ) -> DeskResult<AvailabilityResponse> {
        let path = "/update_status";
        let req = self
            .request(Method::POST, path)
            .json(&serde_json::json!({ "food": food, "status": status }));
        self.send_json(req, path).await
    }

    async fn update_stock(&self, target: &StockTarget, new_stock: i64) -> DeskResult<()> {
        let (path, key) = match target {
            StockTarget::Food(_) => ("/update_stock", "food_name"),
            StockTarget::Ingredient(_) => ("/update_ingredient_stock", "ingredient_name"),
        };
        let stock = new_stock.to_string();
        let req = self
            .request(Method::POST, path)
            .form(&[(key, target.name()), ("new_stock", stock.as_str())]);
        self.send(req, path).await.map(|_| ())
    }

    async fn food_stock(&self) -> DeskResult<HashMap<String, i64>> {
        let path = "/get_food_stock";
        self.send_json(self.request(Method::GET, path), path).await
    }

    async fn check_notifications(&self) -> DeskResult<Vec<Notification>> {
        let path = "/api/check_notifications";
        self.send_json(self.request(Method::GET, path), path).await
    }

    async fn mark_notification_read(&self, notification_id: i64) -> DeskResult<()> {
        let path = format!("/api/mark_notification_read/{notification_id}");
        self.send(self.request(Method::POST, &path), &path)
            .await
            .map(|_| ())
    }

    async fn user_orders(&self) -> DeskResult<Vec<TrackerSnapshot>> {
        let path = "/api/user_orders";
        self.send_json(self.request(Method::GET, path), path).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        stage: TrackerStage,
    ) -> DeskResult<ActionResponse> {
        let path = format!("/update_order_status/{order_id}");
        let req = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({ "status": stage.to_string() }));
        let resp: ActionResponse = self.send_json(req, &path).await?;
        require_success(resp.success, resp.message.clone(), None)?;
        Ok(resp)
    }

    async fn approve_order(&self, order_id: i64) -> DeskResult<ApproveResponse> {
        let path = format!("/approve_order/{order_id}");
        let resp: ApproveResponse = self
            .send_json(self.request(Method::POST, &path), &path)
            .await?;
        require_success(resp.success, resp.message.clone(), resp.details.clone())?;
        Ok(resp)
    }

    async fn reject_order(&self, order_id: i64) -> DeskResult<ActionResponse> {
        let path = format!("/reject_order/{order_id}");
        let resp: ActionResponse = self
            .send_json(self.request(Method::POST, &path), &path)
            .await?;
        require_success(resp.success, resp.message.clone(), None)?;
        Ok(resp)
    }

    async fn mark_order_served(&self, order_id: i64) -> DeskResult<ServeResponse> {
        let path = format!("/mark_order_served/{order_id}");
        let resp: ServeResponse = self
            .send_json(self.request(Method::POST, &path), &path)
            .await?;
        require_success(resp.success, resp.message.clone(), None)?;
        Ok(resp)
    }
}
