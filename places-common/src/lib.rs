//! # Places Common Library
//!
//! Shared code for the places-autocomplete workspace:
//! - Error types
//! - TOML configuration loading and API key resolution
//! - Session event types and EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, SessionEvent};
