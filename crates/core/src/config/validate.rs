use super::{
    types::{Config, DownloadClientBackend},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Listing URL is not empty
/// - The selected download client backend has its section
/// - Sync limits are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(listing) = &config.listing {
        if listing.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "listing.url cannot be empty".to_string(),
            ));
        }
    }

    if let Some(dc) = &config.download_client {
        let section_present = match dc.backend {
            DownloadClientBackend::QBittorrent => dc.qbittorrent.is_some(),
            DownloadClientBackend::Librqbit => dc.librqbit.is_some(),
        };
        if !section_present {
            return Err(ConfigError::ValidationError(format!(
                "download_client.backend is \"{0}\" but [download_client.{0}] is missing",
                dc.backend.as_str()
            )));
        }
    }

    if config.sync.episode_ceiling <= 0 {
        return Err(ConfigError::ValidationError(
            "sync.episode_ceiling must be positive".to_string(),
        ));
    }
    if config.sync.call_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "sync.call_timeout_ms cannot be 0".to_string(),
        ));
    }
    if config.sync.max_concurrent_titles == 0 {
        return Err(ConfigError::ValidationError(
            "sync.max_concurrent_titles cannot be 0".to_string(),
        ));
    }

    Ok(())
}
