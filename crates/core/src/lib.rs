pub mod config;
pub mod download_client;
pub mod listing;
pub mod matcher;
pub mod metrics;
pub mod operation;
pub mod sync;
pub mod testing;
pub mod titles;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    DownloadClientBackend, DownloadClientConfig, ListingConfig, SanitizedConfig, ServerConfig,
    SyncConfig,
};
pub use download_client::{
    DownloadClient, DownloadClientError, LibrqbitClient, QBittorrentClient, SubmitHandle,
    SubmitOptions,
};
pub use listing::{HttpListingSource, ListingError, ListingSource, TorrentRecord};
pub use matcher::{compute_local_episode, EpisodeMatcher, MatchError};
pub use operation::{OperationRecorder, OperationResult, OperationType, ResponseCode};
pub use sync::{
    AddReleaseRequest, SyncContext, SyncEngine, SyncError, SyncRequest, UpdateReleaseRequest,
};
pub use titles::{SqliteTitleStore, TitleRecord, TitleStore, TitleStoreError};
