//! Remote place-search service client
//!
//! Two operations against the remote service:
//! - `GET {base}/autocomplete/json?input=<term>&<query>` → `{predictions, status}`
//! - `GET {base}/details/json?placeid=<id>&<query>` → `{status, result}`
//!
//! No retry, caching or rate limiting happens here; the session's debouncer is
//! the only throttle.

use crate::error::{PlacesError, PlacesResult};
use crate::models::{DetailsEnvelope, PlaceDetail, SearchResponse};
use crate::query::NormalizedQuery;
use crate::transport::{HttpResponse, Transport};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

/// Default remote service base URL
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Place-search client
#[derive(Clone)]
pub struct PlacesClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl PlacesClient {
    /// Create client against the default base URL
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(transport, DEFAULT_BASE_URL)
    }

    /// Create client against a custom base URL (trailing slash optional)
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the autocomplete URL, proxied when a proxy base is given
    pub fn autocomplete_url(
        &self,
        term: &str,
        query: &NormalizedQuery,
        proxy_url: Option<&str>,
    ) -> PlacesResult<String> {
        self.endpoint_url("autocomplete/json", ("input", term), query, proxy_url)
    }

    /// Build the details URL, proxied when a proxy base is given
    pub fn details_url(
        &self,
        place_id: &str,
        query: &NormalizedQuery,
        proxy_url: Option<&str>,
    ) -> PlacesResult<String> {
        self.endpoint_url("details/json", ("placeid", place_id), query, proxy_url)
    }

    fn endpoint_url(
        &self,
        path: &str,
        lead: (&str, &str),
        query: &NormalizedQuery,
        proxy_url: Option<&str>,
    ) -> PlacesResult<String> {
        let endpoint = format!("{}/{}", self.base_url, path);
        let mut url = Url::parse(&endpoint).map_err(|e| {
            PlacesError::Configuration(format!("Invalid service URL {}: {}", endpoint, e))
        })?;

        let encoded: Vec<String> = std::iter::once(lead)
            .chain(query.iter())
            .map(|(name, value)| format!("{}={}", encode_component(name), encode_component(value)))
            .collect();
        url.set_query(Some(&encoded.join("&")));

        Ok(match proxy_url {
            Some(proxy) => format!("{}{}", proxy, url),
            None => url.to_string(),
        })
    }

    /// Query autocomplete predictions for `term`
    ///
    /// Predictions and status are returned exactly as the service sent them.
    ///
    /// # Errors
    /// `Transport` on non-success HTTP status (carries the status text), connectivity
    /// failure or undecodable body.
    pub async fn search(
        &self,
        term: &str,
        query: &NormalizedQuery,
        proxy_url: Option<&str>,
        headers: &BTreeMap<String, String>,
    ) -> PlacesResult<SearchResponse> {
        let url = self.autocomplete_url(term, query, proxy_url)?;
        debug!(term = %term, proxied = proxy_url.is_some(), "Querying autocomplete endpoint");

        let response = self.transport.get(&url, headers).await?;
        ensure_success(&response)?;

        let body: SearchResponse = serde_json::from_str(&response.body)?;
        debug!(
            term = %term,
            status = %body.status,
            predictions = body.predictions.len(),
            "Autocomplete response decoded"
        );
        Ok(body)
    }

    /// Fetch the full record for one place
    ///
    /// # Errors
    /// `Transport` on non-success HTTP status, empty `status` field, missing
    /// `result`, connectivity failure or undecodable body.
    pub async fn search_details(
        &self,
        place_id: &str,
        query: &NormalizedQuery,
        proxy_url: Option<&str>,
        headers: &BTreeMap<String, String>,
    ) -> PlacesResult<PlaceDetail> {
        let url = self.details_url(place_id, query, proxy_url)?;
        debug!(place_id = %place_id, proxied = proxy_url.is_some(), "Querying details endpoint");

        let response = self.transport.get(&url, headers).await?;
        ensure_success(&response)?;

        let envelope: DetailsEnvelope = serde_json::from_str(&response.body)?;
        let status = envelope.status.unwrap_or_default();
        if status.is_empty() {
            warn!(place_id = %place_id, "Details response carried no status");
            return Err(PlacesError::Transport(
                envelope
                    .error_message
                    .unwrap_or_else(|| "Details response has no status".to_string()),
            ));
        }

        let result = envelope.result.ok_or_else(|| {
            PlacesError::Transport(format!("Details response ({}) has no result", status))
        })?;
        let detail: PlaceDetail = serde_json::from_value(result)?;

        debug!(place_id = %place_id, status = %status, "Details response decoded");
        Ok(detail)
    }
}

/// Percent-encode one query component, spaces as `%20`
fn encode_component(raw: &str) -> String {
    // byte_serialize writes a literal '+' as %2B, so any '+' left is a space
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn ensure_success(response: &HttpResponse) -> PlacesResult<()> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "Remote service returned error status");
    let text = if response.status_text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        response.status_text.clone()
    };
    Err(PlacesError::Transport(text))
}
