//! Autocomplete session orchestrator
//!
//! Owns the session state and wires input through the debouncer into the remote
//! service client:
//!
//! ```text
//! set_term ──► DebounceController ──► dispatcher task ──► search task (per settled value)
//!                                                             │
//!                          SessionState ◄── apply (liveness + sequence check)
//! ```
//!
//! # State Rules
//! - `term` is updated immediately on `set_term`
//! - Settled values shorter than `min_length` clear `results` without a remote call
//! - Every dispatched search gets a sequence number; a response older than the
//!   last applied one is discarded
//! - `is_searching` clears when the newest dispatched search resolves
//! - A failed search records `last_error` and keeps the previous results
//! - After teardown no state changes are applied
//!
//! Sessions must be created inside a tokio runtime.

use crate::debounce::{DebounceController, Debouncer};
use crate::error::{PlacesError, PlacesResult};
use crate::models::{PlaceDetail, Prediction, SearchResponse};
use crate::mount_guard::{Liveness, MountGuard};
use crate::options::SearchOptions;
use crate::query::{normalize, NormalizedQuery, QueryParams};
use crate::service::PlacesClient;
use places_common::config::is_valid_key;
use places_common::events::{EventBus, SessionEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Event channel capacity per session
const EVENT_CAPACITY: usize = 100;

/// Point-in-time copy of the observable session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub term: String,
    pub debounced_term: String,
    pub results: Vec<Prediction>,
    pub is_searching: bool,
    pub last_error: Option<PlacesError>,
}

#[derive(Debug, Default)]
struct SessionState {
    term: String,
    debounced_term: String,
    results: Vec<Prediction>,
    is_searching: bool,
    last_error: Option<PlacesError>,
    /// Sequence number of the most recently dispatched search
    latest_dispatched: u64,
    /// Responses with a sequence number at or below this are stale
    last_applied: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            term: self.term.clone(),
            debounced_term: self.debounced_term.clone(),
            results: self.results.clone(),
            is_searching: self.is_searching,
            last_error: self.last_error.clone(),
        }
    }

    /// Drop results and make every in-flight response stale
    fn invalidate_results(&mut self) {
        self.results.clear();
        self.last_applied = self.latest_dispatched;
    }
}

struct SessionInner {
    id: Uuid,
    api_key: String,
    options: SearchOptions,
    client: PlacesClient,
    liveness: Arc<dyn Liveness>,
    state: RwLock<SessionState>,
    events: EventBus,
}

/// Stateful autocomplete orchestrator
///
/// # Example
/// ```rust,ignore
/// let client = PlacesClient::new(Arc::new(ReqwestTransport::new(None)?));
/// let session = AutocompleteSession::new(api_key, SearchOptions::default(), client);
///
/// session.set_term("56 av").await;
/// let mut events = session.subscribe();
/// while let Ok(event) = events.recv().await {
///     render(session.snapshot().await);
/// }
/// ```
pub struct AutocompleteSession {
    inner: Arc<SessionInner>,
    debounce: DebounceController<String>,
    dispatcher: JoinHandle<()>,
}

impl AutocompleteSession {
    /// Create a session with its own mount guard
    pub fn new(api_key: impl Into<String>, options: SearchOptions, client: PlacesClient) -> Self {
        Self::with_liveness(api_key, options, client, Arc::new(MountGuard::new()))
    }

    /// Create a session with an injected liveness capability
    pub fn with_liveness(
        api_key: impl Into<String>,
        options: SearchOptions,
        client: PlacesClient,
        liveness: Arc<dyn Liveness>,
    ) -> Self {
        let debouncer = match &options.term_equality {
            Some(equality) => Debouncer::with_equality(
                options.debounce,
                options.debounce_behavior,
                equality.as_fn(),
            ),
            None => Debouncer::new(options.debounce, options.debounce_behavior),
        }
        .seeded(String::new());
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let debounce = DebounceController::spawn(debouncer, settled_tx);

        let inner = Arc::new(SessionInner {
            id: Uuid::new_v4(),
            api_key: api_key.into(),
            options,
            client,
            liveness,
            state: RwLock::new(SessionState::default()),
            events: EventBus::new(EVENT_CAPACITY),
        });

        let dispatcher = tokio::spawn(dispatch_settled(Arc::clone(&inner), settled_rx));

        debug!(session_id = %inner.id, "Autocomplete session created");

        Self {
            inner,
            debounce,
            dispatcher,
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn options(&self) -> &SearchOptions {
        &self.inner.options
    }

    pub fn is_active(&self) -> bool {
        self.inner.liveness.is_active()
    }

    /// Subscribe to state-change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Store the raw input and feed it to the debouncer
    ///
    /// Ignored after teardown.
    pub async fn set_term(&self, value: impl Into<String>) {
        let value = value.into();
        if !self.is_active() {
            debug!(session_id = %self.inner.id, "set_term after teardown ignored");
            return;
        }

        {
            let mut state = self.inner.state.write().await;
            state.term = value.clone();
        }
        self.inner.events.emit_lossy(SessionEvent::TermChanged {
            session_id: self.inner.id,
            term: value.clone(),
            timestamp: chrono::Utc::now(),
        });

        if !self.debounce.push(value) {
            warn!(session_id = %self.inner.id, "Debounce controller stopped; term not scheduled");
        }
    }

    /// Fetch the full record for `place_id`
    ///
    /// Independent of the search state machine: errors go to the caller and
    /// session state is untouched.
    pub async fn search_details(&self, place_id: &str) -> PlacesResult<PlaceDetail> {
        self.inner.check_ready()?;
        let query = normalize(&QueryParams::for_details(
            &self.inner.api_key,
            &self.inner.options,
        ))?;

        self.inner
            .client
            .search_details(
                place_id,
                &query,
                self.inner.options.proxy_url.as_deref(),
                &self.inner.options.headers,
            )
            .await
    }

    /// Empty the results and mark the session idle
    pub async fn clear_search(&self) {
        if !self.is_active() {
            return;
        }
        let mut state = self.inner.state.write().await;
        if !self.is_active() {
            return;
        }
        state.invalidate_results();
        state.is_searching = false;
        self.inner.emit_cleared();
    }

    /// Deactivate the session
    ///
    /// Stops the debouncer; in-flight searches keep running but their responses
    /// are discarded.
    pub fn teardown(&self) {
        if !self.inner.liveness.is_active() {
            self.stop_tasks();
            return;
        }
        self.inner.liveness.deactivate();
        self.stop_tasks();
        self.inner.events.emit_lossy(SessionEvent::SessionClosed {
            session_id: self.inner.id,
            timestamp: chrono::Utc::now(),
        });
        info!(session_id = %self.inner.id, "Autocomplete session torn down");
    }

    fn stop_tasks(&self) {
        self.debounce.stop();
        self.dispatcher.abort();
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.read().await.snapshot()
    }

    pub async fn term(&self) -> String {
        self.inner.state.read().await.term.clone()
    }

    pub async fn debounced_term(&self) -> String {
        self.inner.state.read().await.debounced_term.clone()
    }

    pub async fn results(&self) -> Vec<Prediction> {
        self.inner.state.read().await.results.clone()
    }

    pub async fn is_searching(&self) -> bool {
        self.inner.state.read().await.is_searching
    }

    pub async fn last_error(&self) -> Option<PlacesError> {
        self.inner.state.read().await.last_error.clone()
    }
}

impl Drop for AutocompleteSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn dispatch_settled(inner: Arc<SessionInner>, mut settled_rx: mpsc::UnboundedReceiver<String>) {
    while let Some(term) = settled_rx.recv().await {
        if !inner.liveness.is_active() {
            break;
        }
        Arc::clone(&inner).on_settled(term).await;
    }
}

impl SessionInner {
    /// Guards that must pass before any remote call
    fn check_ready(&self) -> PlacesResult<()> {
        if !is_valid_key(&self.api_key) {
            return Err(PlacesError::Configuration("An API key is required".to_string()));
        }
        if self.options.runtime_context.requires_proxy() && self.options.proxy_url.is_none() {
            return Err(PlacesError::Configuration(
                "A proxy URL is required in a browser context".to_string(),
            ));
        }
        Ok(())
    }

    fn search_query(&self) -> PlacesResult<NormalizedQuery> {
        self.check_ready()?;
        normalize(&QueryParams::for_search(&self.api_key, &self.options))
    }

    async fn on_settled(self: Arc<Self>, term: String) {
        let mut state = self.state.write().await;
        if !self.liveness.is_active() {
            return;
        }
        state.debounced_term = term.clone();

        if term.chars().count() < self.options.min_length {
            debug!(session_id = %self.id, "Settled term below minimum length; clearing results");
            state.invalidate_results();
            self.emit_cleared();
            return;
        }

        let query = match self.search_query() {
            Ok(query) => query,
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "Search not dispatched");
                state.last_error = Some(err.clone());
                self.events.emit_lossy(SessionEvent::SearchFailed {
                    session_id: self.id,
                    sequence: 0,
                    message: err.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return;
            }
        };

        state.latest_dispatched += 1;
        let sequence = state.latest_dispatched;
        state.is_searching = true;
        drop(state);

        self.events.emit_lossy(SessionEvent::SearchStarted {
            session_id: self.id,
            sequence,
            term: term.clone(),
            timestamp: chrono::Utc::now(),
        });
        debug!(session_id = %self.id, sequence, term = %term, "Dispatching search");

        tokio::spawn(async move {
            let result = self
                .client
                .search(
                    &term,
                    &query,
                    self.options.proxy_url.as_deref(),
                    &self.options.headers,
                )
                .await;
            self.apply_search_result(sequence, result).await;
        });
    }

    async fn apply_search_result(&self, sequence: u64, result: PlacesResult<SearchResponse>) {
        if !self.liveness.is_active() {
            debug!(session_id = %self.id, sequence, "Session inactive; response discarded");
            return;
        }
        let mut state = self.state.write().await;
        if !self.liveness.is_active() {
            return;
        }

        if sequence == state.latest_dispatched {
            state.is_searching = false;
        }
        if sequence <= state.last_applied {
            debug!(
                session_id = %self.id,
                sequence,
                last_applied = state.last_applied,
                "Stale response discarded"
            );
            return;
        }
        state.last_applied = sequence;

        match result {
            Ok(response) => {
                info!(
                    session_id = %self.id,
                    sequence,
                    status = %response.status,
                    count = response.predictions.len(),
                    "Search results applied"
                );
                state.results = response.predictions;
                state.last_error = None;
                self.events.emit_lossy(SessionEvent::ResultsUpdated {
                    session_id: self.id,
                    sequence,
                    count: state.results.len(),
                    status: response.status,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(err) => {
                warn!(session_id = %self.id, sequence, error = %err, "Search failed");
                self.events.emit_lossy(SessionEvent::SearchFailed {
                    session_id: self.id,
                    sequence,
                    message: err.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                state.last_error = Some(err);
            }
        }
    }

    fn emit_cleared(&self) {
        self.events.emit_lossy(SessionEvent::ResultsCleared {
            session_id: self.id,
            timestamp: chrono::Utc::now(),
        });
    }
}
