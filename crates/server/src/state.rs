use std::sync::Arc;
use toloka_core::{Config, SanitizedConfig, SyncEngine, TitleStore};

/// Shared application state
pub struct AppState {
    config: Config,
    titles: Arc<dyn TitleStore>,
    engine: Option<Arc<SyncEngine>>,
}

impl AppState {
    pub fn new(
        config: Config,
        titles: Arc<dyn TitleStore>,
        engine: Option<Arc<SyncEngine>>,
    ) -> Self {
        Self {
            config,
            titles,
            engine,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn titles(&self) -> &dyn TitleStore {
        self.titles.as_ref()
    }

    /// The engine, if both a listing source and a download client are configured.
    pub fn engine(&self) -> Option<&SyncEngine> {
        self.engine.as_deref()
    }
}
