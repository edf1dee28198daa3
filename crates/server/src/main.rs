use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toloka_core::{
    load_config, validate_config, DownloadClient, DownloadClientBackend, HttpListingSource,
    LibrqbitClient, ListingSource, QBittorrentClient, SqliteTitleStore, SyncContext, SyncEngine,
    TitleStore,
};

use toloka_server::api::create_router;
use toloka_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TOLOKA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);

    // Create SQLite title store
    let titles: Arc<dyn TitleStore> = Arc::new(
        SqliteTitleStore::new(&config.database.path).context("Failed to create title store")?,
    );
    info!("Title store initialized");

    // Create listing source if configured
    let listing: Option<Arc<dyn ListingSource>> = match &config.listing {
        Some(listing_config) => {
            info!("Initializing listing source at {}", listing_config.url);
            let source = HttpListingSource::new(listing_config.clone())
                .context("Failed to create listing source")?;
            Some(Arc::new(source))
        }
        None => {
            info!("No listing source configured");
            None
        }
    };

    // Create download client if configured
    let client: Option<Arc<dyn DownloadClient>> = match &config.download_client {
        Some(dc_config) => match dc_config.backend {
            DownloadClientBackend::QBittorrent => match &dc_config.qbittorrent {
                Some(qbit_config) => {
                    info!("Initializing qBittorrent client at {}", qbit_config.url);
                    let client = QBittorrentClient::new(qbit_config.clone())
                        .context("Failed to create qBittorrent client")?;
                    Some(Arc::new(client))
                }
                None => {
                    error!("qBittorrent backend selected but no qbittorrent config provided");
                    None
                }
            },
            DownloadClientBackend::Librqbit => match &dc_config.librqbit {
                Some(librqbit_config) => {
                    info!(
                        "Initializing embedded librqbit client (download path: {})",
                        librqbit_config.download_path
                    );
                    match LibrqbitClient::new(librqbit_config).await {
                        Ok(client) => Some(Arc::new(client)),
                        Err(e) => {
                            error!("Failed to initialize librqbit client: {}", e);
                            None
                        }
                    }
                }
                None => {
                    error!("librqbit backend selected but no librqbit config provided");
                    None
                }
            },
        },
        None => {
            info!("No download client configured");
            None
        }
    };

    // The engine needs both collaborators
    let engine = match (listing, client) {
        (Some(listing), Some(client)) => {
            info!(
                listing = listing.name(),
                client = client.name(),
                "Sync engine ready"
            );
            Some(Arc::new(SyncEngine::new(SyncContext {
                config: config.sync.clone(),
                titles: Arc::clone(&titles),
                listing,
                client,
            })))
        }
        (listing, client) => {
            warn!(
                "Sync engine disabled (listing source: {}, download client: {})",
                listing.is_some(),
                client.is_some()
            );
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), titles, engine));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
