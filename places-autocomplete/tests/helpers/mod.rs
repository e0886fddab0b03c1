//! Scripted transport for integration tests
//!
//! Routes match on the `input` (autocomplete) or `placeid` (details) query
//! parameter. Each route can delay its response to simulate slow requests.

#![allow(dead_code)]

use async_trait::async_trait;
use places_autocomplete::{HttpResponse, PlacesClient, PlacesError, PlacesResult, Transport};
use reqwest::Url;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_BASE_URL: &str = "https://places.test/api";

#[derive(Clone)]
struct Route {
    key: String,
    delay: Duration,
    response: PlacesResult<HttpResponse>,
}

/// One recorded request
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl RecordedCall {
    /// Decoded query parameter from the request URL (proxy prefix stripped)
    pub fn param(&self, name: &str) -> Option<String> {
        let target = match self.url.find(TEST_BASE_URL) {
            Some(pos) => &self.url[pos..],
            None => &self.url,
        };
        let url = Url::parse(target).ok()?;
        let value = url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned());
        value
    }
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Respond to `key` with a 200 and the given JSON body
    pub fn respond_json(&self, key: &str, body: serde_json::Value) {
        self.respond_after(key, Duration::ZERO, Ok(HttpResponse::ok(body.to_string())));
    }

    /// Respond to `key` after `delay`
    pub fn respond_json_after(&self, key: &str, delay: Duration, body: serde_json::Value) {
        self.respond_after(key, delay, Ok(HttpResponse::ok(body.to_string())));
    }

    /// Respond to `key` with an HTTP error status
    pub fn respond_status(&self, key: &str, status: u16, status_text: &str) {
        self.respond_after(
            key,
            Duration::ZERO,
            Ok(HttpResponse {
                status,
                status_text: status_text.to_string(),
                body: String::new(),
            }),
        );
    }

    /// Fail `key` at the connection level
    pub fn fail(&self, key: &str, message: &str) {
        self.respond_after(
            key,
            Duration::ZERO,
            Err(PlacesError::Transport(message.to_string())),
        );
    }

    pub fn respond_after(&self, key: &str, delay: Duration, response: PlacesResult<HttpResponse>) {
        self.routes.lock().unwrap().push(Route {
            key: key.to_string(),
            delay,
            response,
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `input` parameter of every autocomplete request, in dispatch order
    pub fn searched_terms(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.param("input"))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> PlacesResult<HttpResponse> {
        let call = RecordedCall {
            url: url.to_string(),
            headers: headers.clone(),
        };
        let key = call
            .param("input")
            .or_else(|| call.param("placeid"))
            .unwrap_or_default();
        self.calls.lock().unwrap().push(call);

        let route = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.key == key)
            .cloned();

        match route {
            Some(route) => {
                if !route.delay.is_zero() {
                    tokio::time::sleep(route.delay).await;
                }
                route.response
            }
            None => Ok(HttpResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: String::new(),
            }),
        }
    }
}

/// Client against the test base URL
pub fn client(transport: &Arc<MockTransport>) -> PlacesClient {
    PlacesClient::with_base_url(Arc::clone(transport) as Arc<dyn Transport>, TEST_BASE_URL)
}

/// `{predictions: [...], status: "OK"}` with one prediction per place id
pub fn predictions_body(place_ids: &[&str]) -> serde_json::Value {
    let predictions: Vec<serde_json::Value> = place_ids
        .iter()
        .enumerate()
        .map(|(i, place_id)| {
            serde_json::json!({
                "id": (i + 1).to_string(),
                "place_id": place_id,
                "description": format!("Place {}", place_id),
            })
        })
        .collect();
    serde_json::json!({ "predictions": predictions, "status": "OK" })
}
