//! Application state wiring the session service together.
//!
//! AppState holds the concrete service instance used by both CLI and REST API.
//! The service is generic over store/provider traits; AppState pins it to the
//! type-erased boxes so the backend can be chosen at startup.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::chat::service::SessionService;
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::store::{BoxDocumentStore, DocumentStore};
use parley_infra::config::{database_url, load_config, resolve_data_dir};
use parley_infra::llm::{api_key_from_env, create_provider};
use parley_infra::store::connect_store;
use parley_types::config::ParleyConfig;

/// Concrete type alias for the service generics pinned to runtime-selected backends.
pub type ConcreteSessionService = SessionService<BoxDocumentStore, BoxLlmProvider>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ConcreteSessionService>,
    pub config: Arc<ParleyConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, open the store, pick
    /// the backend.
    ///
    /// Never fails on an unreachable database; the store falls back to memory.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        if let Err(e) = tokio::fs::create_dir_all(&data_dir).await {
            tracing::warn!(path = %data_dir.display(), error = %e, "Cannot create data directory");
        }

        let config = load_config(&data_dir).await;
        let store = connect_store(&database_url(&config, &data_dir)).await;
        let provider = create_provider(&config, api_key_from_env());

        Ok(Self::new(config, data_dir, store, provider))
    }

    /// Wire state from already-built parts.
    pub fn new(
        config: ParleyConfig,
        data_dir: PathBuf,
        store: BoxDocumentStore,
        provider: BoxLlmProvider,
    ) -> Self {
        let sessions = SessionService::new(store, provider, config.chat_settings());
        Self {
            sessions: Arc::new(sessions),
            config: Arc::new(config),
            data_dir,
        }
    }

    /// Which store backend is live ("sqlite" or "memory").
    pub fn store_backend(&self) -> &str {
        self.sessions.store().backend()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parley_core::store::memory::MemoryDocumentStore;
    use parley_infra::llm::OfflineProvider;

    /// State backed by the in-memory store and the offline provider.
    pub fn offline_state() -> AppState {
        AppState::new(
            ParleyConfig::default(),
            PathBuf::from("."),
            BoxDocumentStore::new(MemoryDocumentStore::new()),
            BoxLlmProvider::new(OfflineProvider),
        )
    }

    #[test]
    fn test_offline_state_reports_memory_backend() {
        let state = offline_state();
        assert_eq!(state.store_backend(), "memory");
        assert_eq!(state.config.recent_limit, 15);
    }
}
