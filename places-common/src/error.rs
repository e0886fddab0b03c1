//! Common error types for places-autocomplete

use thiserror::Error;

/// Common result type for configuration and bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the workspace crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or option value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
