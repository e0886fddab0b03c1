//! # places-autocomplete
//!
//! Input-driven place autocomplete client. Free-text input is debounced, sent to
//! a remote place-search service, and the normalized results are exposed to a
//! presentation layer along with an on-demand details lookup.
//!
//! Components (leaf to root):
//! - [`query`]: option fields → wire query parameters
//! - [`service`]: search and details calls against the remote service
//! - [`debounce`]: input coalescing state machine and its tokio driver
//! - [`mount_guard`]: liveness flag gating asynchronous state commits
//! - [`session`]: the stateful orchestrator

pub mod debounce;
pub mod error;
pub mod models;
pub mod mount_guard;
pub mod options;
pub mod query;
pub mod service;
pub mod session;
pub mod transport;

pub use crate::error::{PlacesError, PlacesResult};
pub use crate::models::{PlaceDetail, Prediction, SearchResponse};
pub use crate::options::{
    DebounceBehavior, LatLng, QueryType, RuntimeContext, SearchOptions, TermEquality,
};
pub use crate::service::PlacesClient;
pub use crate::session::{AutocompleteSession, SessionSnapshot};
pub use crate::transport::{HttpResponse, ReqwestTransport, Transport};
