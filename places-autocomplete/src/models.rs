//! Remote service payload types
//!
//! Field names follow the remote service's snake_case JSON. Optional fields
//! default to empty so partial payloads still decode.

use serde::{Deserialize, Serialize};

// ============================================================================
// Autocomplete
// ============================================================================

/// Autocomplete response body, returned verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One candidate location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub place_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub structured_formatting: StructuredFormatting,
    #[serde(default)]
    pub matched_substrings: Vec<MatchedSubstring>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub types: Vec<String>,
    /// Straight-line distance from the configured origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u64>,
}

/// Main/secondary text split of a prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFormatting {
    #[serde(default)]
    pub main_text: String,
    #[serde(default)]
    pub secondary_text: String,
    #[serde(default)]
    pub main_text_matched_substrings: Vec<MatchedSubstring>,
}

/// Offset/length of input text matched within a description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedSubstring {
    pub offset: usize,
    pub length: usize,
}

/// One term of a prediction description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub offset: usize,
    pub value: String,
}

// ============================================================================
// Details
// ============================================================================

/// Details response envelope
///
/// `result` is kept undecoded until the status has been checked.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetailsEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Full place record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Offset from UTC in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adr_address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub northeast: Location,
    pub southwest: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}
