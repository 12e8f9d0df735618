//! Minimal Sentry REST API client.
//!
//! Only the endpoints the provider manages are covered. Every request is
//! authenticated with a bearer token; status codes are mapped onto
//! [`ApiError`] so callers can tell a missing object apart from a failure.

mod dashboards;
mod monitors;

pub use dashboards::{Dashboard, DashboardRequest, DashboardWidget, WidgetLayout, WidgetQuery};
pub use monitors::{
    FlexibleId, Monitor, MonitorConfig, MonitorConfigRequest, MonitorOwner, MonitorProject,
    MonitorRequest,
};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("terraform-provider-sentry/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned by [`SentryClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 404.
    #[error("404 Not Found")]
    NotFound,

    /// The API answered with a non-success status other than 404.
    #[error("{status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error detail from the response body.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL or a request path is not usable.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The auth token cannot be sent as a header value.
    #[error("invalid auth token: {0}")]
    InvalidToken(String),
}

impl ApiError {
    /// Whether the API reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

/// Authenticated client for the Sentry REST API.
#[derive(Debug, Clone)]
pub struct SentryClient {
    http: Client,
    base_url: Url,
}

impl SentryClient {
    /// Build a client for `base_url` (e.g. `https://sentry.io/api/`).
    pub fn new(base_url: Url, token: &str) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL, with a trailing slash.
    ///
    /// Each segment is percent-encoded, so slugs can never escape their
    /// position in the path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Send a request and decode a JSON body from a success response.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request whose success response carries no body of interest.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        debug!(status = %status, url = %response.url(), "Sentry API response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = error_detail(&text);
            warn!(status = status.as_u16(), body = %body, "Sentry API error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Sentry reports errors as `{"detail": "..."}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
