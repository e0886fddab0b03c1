//! Query normalization
//!
//! Turns user-facing option fields into the exact wire parameters for a remote
//! call. Pure: no I/O, no logging.

use crate::error::{PlacesError, PlacesResult};
use crate::options::{LatLng, QueryType, SearchOptions};
use std::collections::BTreeMap;

/// Raw query fields before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub key: String,
    pub language: String,
    pub types: Option<QueryType>,
    pub components: Option<String>,
    pub radius: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub origin: Option<LatLng>,
    pub strict_bounds: Option<bool>,
}

impl QueryParams {
    /// Fields sent with an autocomplete search
    pub fn for_search(api_key: &str, options: &SearchOptions) -> Self {
        Self {
            key: api_key.to_string(),
            language: options.language.clone(),
            types: Some(options.query_types),
            components: options.components.clone(),
            radius: options.radius.clone(),
            lat: options.lat,
            lng: options.lng,
            origin: options.origin,
            strict_bounds: options.strict_bounds,
        }
    }

    /// Fields sent with a details lookup (no location biasing)
    pub fn for_details(api_key: &str, options: &SearchOptions) -> Self {
        Self {
            key: api_key.to_string(),
            language: options.language.clone(),
            types: Some(options.query_types),
            components: options.components.clone(),
            ..Self::default()
        }
    }
}

/// Wire-format query parameters, kept in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    params: BTreeMap<&'static str, String>,
}

impl NormalizedQuery {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in serialization order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        self.params.insert(name, value.into());
    }
}

/// Normalize raw query fields into wire parameters
///
/// # Errors
/// `InvalidQuery` when exactly one of `lat`/`lng` is set.
pub fn normalize(params: &QueryParams) -> PlacesResult<NormalizedQuery> {
    let location = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
        (None, None) => None,
        _ => {
            return Err(PlacesError::InvalidQuery(
                "latitude and longitude must both be provided or both omitted".to_string(),
            ))
        }
    };

    let mut query = NormalizedQuery::default();
    query.insert("key", params.key.as_str());
    query.insert("language", params.language.as_str());

    if let Some(types) = params.types {
        query.insert("types", types.as_wire());
    }
    if let Some(components) = &params.components {
        query.insert("components", components.as_str());
    }
    if let Some(radius) = &params.radius {
        query.insert("radius", radius.as_str());
    }
    if let Some(location) = location {
        query.insert("location", location.to_string());
    }
    if let Some(origin) = params.origin {
        query.insert("origin", origin.to_string());
    }
    if let Some(strict) = params.strict_bounds {
        query.insert("strictbounds", strict.to_string());
    }

    Ok(query)
}
