//! Composition root: wires storage, client and session for one CLI run.

use anyhow::{Context, Result, bail};
use mockapi_application::{ResourceService, SessionManager};
use mockapi_core::config::ClientConfig;
use mockapi_infrastructure::{ConfigService, CredentialStore, MockApiPaths, TomlSlotStorage};
use mockapi_interaction::ApiClient;
use std::path::Path;
use std::sync::Arc;

pub struct Console {
    pub config: ClientConfig,
    pub session: Arc<SessionManager>,
    pub resources: ResourceService,
}

impl Console {
    /// Loads configuration and restores any persisted session.
    pub fn bootstrap(config_dir: Option<&Path>) -> Result<Self> {
        let paths = MockApiPaths::new(config_dir);
        let config_service = ConfigService::new(&paths)?;
        let config = config_service
            .load()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;

        let storage = Arc::new(TomlSlotStorage::new(paths.storage_file()?));
        tracing::debug!(
            "[Bootstrap] Token slot '{}' in {}",
            config.storage.token_slot,
            storage.path().display()
        );
        let store = Arc::new(CredentialStore::new(
            storage,
            config.storage.token_slot.clone(),
        ));
        let client = Arc::new(
            ApiClient::new(config.api.base_url.clone(), config.api.request_timeout())
                .context("Failed to create HTTP client")?,
        );

        let session = Arc::new(SessionManager::new(store, client));
        let state = session.bootstrap();
        tracing::debug!(
            "[Bootstrap] API at {}, authenticated: {}",
            config.api.base_url,
            state.is_authenticated()
        );

        Ok(Self {
            resources: ResourceService::new(session.clone()),
            config,
            session,
        })
    }

    /// Route guard for commands that need a session.
    pub fn require_session(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("Not logged in. Run `mockapi login --email <email>` first.");
        }
        Ok(())
    }
}
