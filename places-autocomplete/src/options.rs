//! Per-session search options
//!
//! Options are fixed when a session is created. Reconfiguring means tearing the
//! session down and creating a new one.

use crate::debounce::EqualityFn;
use places_common::config::SearchConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default minimum term length before searching
pub const DEFAULT_MIN_LENGTH: usize = 2;

/// Default debounce wait (milliseconds)
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default query language
pub const DEFAULT_LANGUAGE: &str = "en";

/// Place type restriction sent as the `types` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    #[default]
    Address,
    Geocode,
    Cities,
    Establishment,
    /// Geocode and establishment results together
    Combined,
}

impl QueryType {
    /// Wire value for the `types` parameter
    pub fn as_wire(&self) -> &'static str {
        match self {
            QueryType::Address => "address",
            QueryType::Geocode => "geocode",
            QueryType::Cities => "(cities)",
            QueryType::Establishment => "establishment",
            QueryType::Combined => "geocode|establishment",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for QueryType {
    type Err = places_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "address" => Ok(QueryType::Address),
            "geocode" => Ok(QueryType::Geocode),
            "cities" | "(cities)" => Ok(QueryType::Cities),
            "establishment" => Ok(QueryType::Establishment),
            "combined" | "geocode|establishment" => Ok(QueryType::Combined),
            other => Err(places_common::Error::InvalidInput(format!(
                "Unknown query type: {}",
                other
            ))),
        }
    }
}

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Where the session runs
///
/// Browser contexts cannot call the remote service directly (same-origin policy),
/// so they require a proxy URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeContext {
    Native,
    Browser,
}

impl RuntimeContext {
    /// Context implied by the compilation target
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            RuntimeContext::Browser
        } else {
            RuntimeContext::Native
        }
    }

    pub fn requires_proxy(&self) -> bool {
        matches!(self, RuntimeContext::Browser)
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::detect()
    }
}

/// Debounce flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceBehavior {
    /// Emit immediately on the first value of a burst
    pub leading: bool,
    /// Emit the latest value once input has been quiet for the wait duration
    pub trailing: bool,
    /// Upper bound on how long a burst may defer emission
    pub max_wait: Option<Duration>,
}

impl Default for DebounceBehavior {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

/// Comparison deciding whether a settled term is unchanged
///
/// Two `TermEquality` values are equal only when they share the same function.
#[derive(Clone)]
pub struct TermEquality(EqualityFn<String>);

impl TermEquality {
    pub fn new<F>(equal: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |a: &String, b: &String| equal(a, b)))
    }

    pub fn as_fn(&self) -> EqualityFn<String> {
        Arc::clone(&self.0)
    }
}

impl fmt::Debug for TermEquality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TermEquality(..)")
    }
}

impl PartialEq for TermEquality {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Minimum term length (characters) before a search is issued
    pub min_length: usize,
    /// Debounce wait
    pub debounce: Duration,
    pub debounce_behavior: DebounceBehavior,
    /// Custom unchanged-term check; `None` compares terms exactly
    pub term_equality: Option<TermEquality>,
    pub language: String,
    pub query_types: QueryType,
    /// Component filter, e.g. `country:fr`
    pub components: Option<String>,
    /// Bias radius in meters
    pub radius: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Point used to compute `distance_meters` on predictions
    pub origin: Option<LatLng>,
    pub strict_bounds: Option<bool>,
    /// Prefix prepended to every outbound URL
    pub proxy_url: Option<String>,
    /// Extra headers sent on every outbound request
    pub headers: BTreeMap<String, String>,
    pub runtime_context: RuntimeContext,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            debounce_behavior: DebounceBehavior::default(),
            term_equality: None,
            language: DEFAULT_LANGUAGE.to_string(),
            query_types: QueryType::default(),
            components: None,
            radius: None,
            lat: None,
            lng: None,
            origin: None,
            strict_bounds: None,
            proxy_url: None,
            headers: BTreeMap::new(),
            runtime_context: RuntimeContext::default(),
        }
    }
}

impl SearchOptions {
    /// Build options from the TOML `[search]` section, falling back to defaults
    pub fn from_config(config: &SearchConfig) -> places_common::Result<Self> {
        let defaults = Self::default();

        let query_types = match config.query_types.as_deref() {
            Some(s) => s.parse()?,
            None => defaults.query_types,
        };

        let origin = match (config.origin_lat, config.origin_lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            (None, None) => None,
            _ => {
                return Err(places_common::Error::InvalidInput(
                    "origin_lat and origin_lng must both be provided or both omitted"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            min_length: config.min_length.unwrap_or(defaults.min_length),
            debounce: config
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            debounce_behavior: DebounceBehavior {
                leading: config.leading.unwrap_or(defaults.debounce_behavior.leading),
                trailing: config.trailing.unwrap_or(defaults.debounce_behavior.trailing),
                max_wait: config.max_wait_ms.map(Duration::from_millis),
            },
            term_equality: None,
            language: config.language.clone().unwrap_or(defaults.language),
            query_types,
            components: config.components.clone(),
            radius: config.radius.clone(),
            lat: config.lat,
            lng: config.lng,
            origin,
            strict_bounds: config.strict_bounds,
            proxy_url: config.proxy_url.clone(),
            headers: config.headers.clone(),
            runtime_context: defaults.runtime_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.min_length, 2);
        assert_eq!(options.debounce, Duration::from_millis(300));
        assert_eq!(options.language, "en");
        assert_eq!(options.query_types, QueryType::Address);
        assert!(options.debounce_behavior.trailing);
        assert!(!options.debounce_behavior.leading);
        assert_eq!(options.runtime_context, RuntimeContext::Native);
    }

    #[test]
    fn test_term_equality_compares_by_identity() {
        let trimmed = TermEquality::new(|a, b| a.trim() == b.trim());
        assert!((trimmed.as_fn())(&"paris".to_string(), &"paris ".to_string()));
        assert_eq!(trimmed, trimmed.clone());
        assert_ne!(trimmed, TermEquality::new(|a, b| a.trim() == b.trim()));
    }

    #[test]
    fn test_query_type_parse() {
        assert_eq!("cities".parse::<QueryType>().unwrap(), QueryType::Cities);
        assert_eq!("(cities)".parse::<QueryType>().unwrap(), QueryType::Cities);
        assert_eq!("Combined".parse::<QueryType>().unwrap(), QueryType::Combined);
        assert!("regions".parse::<QueryType>().is_err());
    }

    #[test]
    fn test_query_type_wire_values() {
        assert_eq!(QueryType::Cities.as_wire(), "(cities)");
        assert_eq!(QueryType::Combined.as_wire(), "geocode|establishment");
    }

    #[test]
    fn test_from_config_overrides() {
        let config = SearchConfig {
            min_length: Some(4),
            debounce_ms: Some(50),
            leading: Some(true),
            max_wait_ms: Some(1000),
            query_types: Some("geocode".to_string()),
            origin_lat: Some(1.5),
            origin_lng: Some(2.5),
            ..SearchConfig::default()
        };

        let options = SearchOptions::from_config(&config).unwrap();
        assert_eq!(options.min_length, 4);
        assert_eq!(options.debounce, Duration::from_millis(50));
        assert!(options.debounce_behavior.leading);
        assert!(options.debounce_behavior.trailing);
        assert_eq!(
            options.debounce_behavior.max_wait,
            Some(Duration::from_millis(1000))
        );
        assert_eq!(options.query_types, QueryType::Geocode);
        assert_eq!(options.origin, Some(LatLng::new(1.5, 2.5)));
        assert_eq!(options.language, "en");
    }

    #[test]
    fn test_from_config_half_origin_rejected() {
        let config = SearchConfig {
            origin_lat: Some(1.0),
            ..SearchConfig::default()
        };
        assert!(SearchOptions::from_config(&config).is_err());
    }
}
