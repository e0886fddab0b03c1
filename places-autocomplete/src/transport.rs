//! HTTP transport seam
//!
//! The remote service client only needs "GET this URL with these headers".
//! `ReqwestTransport` is the production implementation; tests script their own.

use crate::error::{PlacesError, PlacesResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("places-autocomplete/", env!("CARGO_PKG_VERSION"));

/// Raw HTTP response handed back to the service client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase, e.g. "Not Found"
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    /// 200 OK with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Black-box fetch capability
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request
    ///
    /// # Errors
    /// `PlacesError::Transport` on connectivity failure. Non-success HTTP statuses
    /// are returned as a normal `HttpResponse`.
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> PlacesResult<HttpResponse>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create transport with an optional per-request timeout
    pub fn new(timeout: Option<Duration>) -> PlacesResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| PlacesError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> PlacesResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| PlacesError::Configuration(format!("Invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| PlacesError::Configuration(format!("Invalid header value: {}", e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> PlacesResult<HttpResponse> {
        let response = self
            .http_client
            .get(url)
            .headers(header_map(headers)?)
            .send()
            .await
            .map_err(|e| PlacesError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;

        debug!(status = status.as_u16(), bytes = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new(None).is_ok());
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5))).is_ok());
    }

    #[test]
    fn test_header_map_rejects_invalid_name() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            header_map(&headers),
            Err(PlacesError::Configuration(_))
        ));
    }

    #[test]
    fn test_header_map_accepts_platform_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Android-Package".to_string(), "com.example".to_string());
        let map = header_map(&headers).unwrap();
        assert_eq!(map.get("x-android-package").unwrap(), "com.example");
    }

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::ok("{}").is_success());
        let not_found = HttpResponse {
            status: 404,
            status_text: "Not Found".to_string(),
            body: String::new(),
        };
        assert!(!not_found.is_success());
    }
}
