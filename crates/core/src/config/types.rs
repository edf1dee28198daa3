use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub listing: Option<ListingConfig>,
    #[serde(default)]
    pub download_client: Option<DownloadClientConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Title store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("toloka.db")
}

/// Listing source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    /// Base URL of the listing API (e.g., "http://localhost:5000").
    pub url: String,
    /// Optional API key sent as `X-Api-Key`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// HTTP client timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Download client configuration. Exactly one backend is used per process.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadClientConfig {
    pub backend: DownloadClientBackend,
    /// Required when backend = "qbittorrent".
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
    /// Required when backend = "librqbit".
    #[serde(default)]
    pub librqbit: Option<LibrqbitConfig>,
}

/// Available download client backends.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum DownloadClientBackend {
    #[serde(rename = "qbittorrent")]
    QBittorrent,
    #[serde(rename = "librqbit")]
    Librqbit,
}

impl DownloadClientBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadClientBackend::QBittorrent => "qbittorrent",
            DownloadClientBackend::Librqbit => "librqbit",
        }
    }
}

/// qBittorrent Web API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080").
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Save path used when a title has no download directory of its own.
    #[serde(default)]
    pub download_path: Option<String>,
}

/// Embedded librqbit session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrqbitConfig {
    pub download_path: String,
    #[serde(default = "default_true")]
    pub enable_dht: bool,
    #[serde(default)]
    pub listen_port: Option<u16>,
    /// Directory for session persistence; no persistence when unset.
    #[serde(default)]
    pub persistence_path: Option<String>,
}

/// Synchronization engine tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Local episode numbers above this are treated as a numbering mismatch.
    #[serde(default = "default_episode_ceiling")]
    pub episode_ceiling: i64,
    /// Upper bound for every listing source and download client call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Titles updated concurrently by an update-all run.
    #[serde(default = "default_max_concurrent_titles")]
    pub max_concurrent_titles: usize,
    /// Category/label attached to every submitted torrent.
    #[serde(default)]
    pub category: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            episode_ceiling: default_episode_ceiling(),
            call_timeout_ms: default_call_timeout_ms(),
            max_concurrent_titles: default_max_concurrent_titles(),
            category: None,
        }
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_episode_ceiling() -> i64 {
    2000
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrent_titles() -> usize {
    1
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<SanitizedListingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_client: Option<SanitizedDownloadClientConfig>,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedListingConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloadClientConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    pub credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            listing: config.listing.as_ref().map(|l| SanitizedListingConfig {
                url: l.url.clone(),
                api_key_configured: l.api_key.as_ref().is_some_and(|k| !k.is_empty()),
                timeout_secs: l.timeout_secs,
            }),
            download_client: config.download_client.as_ref().map(|dc| {
                let (url, download_path, credentials_configured) = match dc.backend {
                    DownloadClientBackend::QBittorrent => match &dc.qbittorrent {
                        Some(q) => (
                            Some(q.url.clone()),
                            q.download_path.clone(),
                            !q.username.is_empty() && !q.password.is_empty(),
                        ),
                        None => (None, None, false),
                    },
                    DownloadClientBackend::Librqbit => (
                        None,
                        dc.librqbit.as_ref().map(|l| l.download_path.clone()),
                        false,
                    ),
                };
                SanitizedDownloadClientConfig {
                    backend: dc.backend.as_str().to_string(),
                    url,
                    download_path,
                    credentials_configured,
                }
            }),
            sync: config.sync.clone(),
        }
    }
}
