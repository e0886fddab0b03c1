//! Error types for places-autocomplete
//!
//! Search failures are stored in session state, so the error is `Clone` and
//! carries owned strings rather than wrapping transport error types.

use thiserror::Error;

/// Autocomplete client error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacesError {
    /// Missing API key, or missing proxy in a context that needs one
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed option combination, detected before any network attempt
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Non-success HTTP status, falsy details status, connectivity or decode failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for autocomplete operations
pub type PlacesResult<T> = Result<T, PlacesError>;

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        PlacesError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for PlacesError {
    fn from(err: serde_json::Error) -> Self {
        PlacesError::Transport(format!("Failed to decode response: {}", err))
    }
}
