//! API client for the conference portal.
//!
//! `RemoteClient` is the fetch capability the sync layer depends on;
//! `ApiClient` implements it over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::wire::{AttendeeWire, EventConfigWire, EventWire, ScheduleWire};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default portal base URL
pub const DEFAULT_BASE_URL: &str = "https://portal.opass.app";

/// HTTP request timeout in seconds.
/// Transport-level only; the sync layer itself never retries or times out.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Stateless fetch capability over the portal and schedule endpoints.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// `GET /events/`
    async fn fetch_events(&self) -> Result<Vec<EventWire>, ApiError>;

    /// `GET /events/{id}/`
    async fn fetch_event_config(&self, event_id: &str) -> Result<EventConfigWire, ApiError>;

    /// `GET {url}` where `url` comes from the event's schedule feature
    async fn fetch_schedule(&self, url: &str) -> Result<ScheduleWire, ApiError>;

    /// `GET /events/{id}/status?token={token}`
    async fn fetch_attendee(&self, event_id: &str, token: &str) -> Result<AttendeeWire, ApiError>;
}

/// HTTP implementation of `RemoteClient`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client against the default portal
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL extended by `segments`, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn events_url(&self) -> Result<Url, ApiError> {
        self.endpoint(&["events", ""])
    }

    fn event_config_url(&self, event_id: &str) -> Result<Url, ApiError> {
        self.endpoint(&["events", event_id, ""])
    }

    fn attendee_url(&self, event_id: &str) -> Result<Url, ApiError> {
        self.endpoint(&["events", event_id, "status"])
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(url = url, bytes = text.len(), "Response received");

        serde_json::from_str(&text).map_err(|e| ApiError::malformed(url, e))
    }
}

#[async_trait]
impl RemoteClient for ApiClient {
    async fn fetch_events(&self) -> Result<Vec<EventWire>, ApiError> {
        self.get(self.events_url()?.as_str(), &[]).await
    }

    async fn fetch_event_config(&self, event_id: &str) -> Result<EventConfigWire, ApiError> {
        self.get(self.event_config_url(event_id)?.as_str(), &[]).await
    }

    async fn fetch_schedule(&self, url: &str) -> Result<ScheduleWire, ApiError> {
        self.get(url, &[]).await
    }

    async fn fetch_attendee(&self, event_id: &str, token: &str) -> Result<AttendeeWire, ApiError> {
        self.get(self.attendee_url(event_id)?.as_str(), &[("token", token)])
            .await
    }
}
