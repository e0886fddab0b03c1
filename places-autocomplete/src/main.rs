//! places-autocomplete - interactive autocomplete front end
//!
//! Reads search terms from stdin (one per line), feeds them through an
//! autocomplete session and prints the predictions whenever they change.
//! With `--details <place_id>` it fetches a single place record and prints it
//! as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use places_autocomplete::{
    AutocompleteSession, PlacesClient, QueryType, ReqwestTransport, SearchOptions,
};
use places_common::config::{load_config, resolve_api_key, TomlConfig};
use places_common::events::SessionEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::info;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Poll interval while waiting for the last search to resolve
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Level used until the config file has been read
const BOOTSTRAP_LOG_LEVEL: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "places-autocomplete")]
#[command(about = "Debounced place autocomplete against a remote place-search service")]
#[command(version)]
struct Args {
    /// Config file (defaults to PLACES_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key (overrides PLACES_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Query language
    #[arg(long)]
    language: Option<String>,

    /// Place types: address, geocode, cities, establishment, combined
    #[arg(long)]
    query_types: Option<QueryType>,

    /// Minimum term length before searching
    #[arg(long)]
    min_length: Option<usize>,

    /// Debounce wait in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Proxy URL prefix for every request
    #[arg(long)]
    proxy_url: Option<String>,

    /// Fetch details for one place id and exit
    #[arg(long)]
    details: Option<String>,
}

impl Args {
    fn apply_overrides(&self, options: &mut SearchOptions) {
        if let Some(language) = &self.language {
            options.language = language.clone();
        }
        if let Some(query_types) = self.query_types {
            options.query_types = query_types;
        }
        if let Some(min_length) = self.min_length {
            options.min_length = min_length;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            options.debounce = Duration::from_millis(debounce_ms);
        }
        if let Some(proxy_url) = &self.proxy_url {
            options.proxy_url = Some(proxy_url.clone());
        }
    }
}

/// Install the subscriber before anything logs
///
/// `RUST_LOG` wins when set; otherwise the bootstrap level applies until
/// [`apply_config_level`] swaps in the configured one.
fn init_tracing() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LOG_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

fn apply_config_level(
    handle: &FilterHandle,
    config: &TomlConfig,
    env_override: bool,
) -> Result<()> {
    if env_override {
        return Ok(());
    }
    handle
        .reload(EnvFilter::new(&config.logging.level))
        .context("Failed to apply configured log level")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = init_tracing();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    apply_config_level(&log_filter, &config, std::env::var_os("RUST_LOG").is_some())?;

    info!("Starting places-autocomplete v{}", env!("CARGO_PKG_VERSION"));

    let api_key = resolve_api_key(args.api_key.as_deref(), &config)?;
    let mut options =
        SearchOptions::from_config(&config.search).context("Invalid [search] configuration")?;
    args.apply_overrides(&mut options);

    let transport = ReqwestTransport::new(config.request_timeout_ms.map(Duration::from_millis))?;
    let client = match &config.base_url {
        Some(base_url) => PlacesClient::with_base_url(Arc::new(transport), base_url.clone()),
        None => PlacesClient::new(Arc::new(transport)),
    };

    let session = AutocompleteSession::new(api_key, options, client);

    if let Some(place_id) = &args.details {
        let detail = session
            .search_details(place_id)
            .await
            .with_context(|| format!("Details lookup failed for {}", place_id))?;
        println!("{}", serde_json::to_string_pretty(&detail)?);
        session.teardown();
        return Ok(());
    }

    run_interactive(session).await
}

async fn run_interactive(session: AutocompleteSession) -> Result<()> {
    let session = Arc::new(session);
    let events = session.subscribe();
    let renderer = tokio::spawn(render_events(Arc::clone(&session), events));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        session.set_term(line).await;
    }

    // Let the final term settle, then wait for its search to resolve
    tokio::time::sleep(session.options().debounce + IDLE_POLL).await;
    while session.is_searching().await {
        tokio::time::sleep(IDLE_POLL).await;
    }

    session.teardown();
    renderer.await.context("Renderer task failed")?;
    Ok(())
}

async fn render_events(
    session: Arc<AutocompleteSession>,
    mut events: broadcast::Receiver<SessionEvent>,
) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::ResultsUpdated { status, .. }) => {
                let snapshot = session.snapshot().await;
                println!(
                    "[{}] {} ({} results)",
                    status,
                    snapshot.debounced_term,
                    snapshot.results.len()
                );
                for prediction in &snapshot.results {
                    println!("  {}  {}", prediction.place_id, prediction.description);
                }
            }
            Ok(SessionEvent::ResultsCleared { .. }) => println!("(no results)"),
            Ok(SessionEvent::SearchFailed { message, .. }) => {
                eprintln!("search failed: {}", message)
            }
            Ok(SessionEvent::SessionClosed { .. }) => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer lagged behind session events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
