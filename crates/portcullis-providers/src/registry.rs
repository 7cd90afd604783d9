//! Provider registry.

use crate::{
    config::ProvidersConfig,
    errors::{ProviderError, Result},
    name::ProviderName,
    traits::OAuthProvider,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Default)]
struct RegistryState {
    internal: ProviderName,
    providers: HashMap<ProviderName, Arc<dyn OAuthProvider>>,
}

/// Configured provider capabilities keyed by name.
///
/// Reads share one lock; loads and registrations take it exclusively and
/// replace entries as a unit.
#[derive(Default)]
pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every provider with those built from `config`.
    ///
    /// Entries without a client key are skipped. If any entry fails to
    /// build, the registry keeps its previous contents.
    pub async fn load_providers(&self, config: &ProvidersConfig) -> Result<()> {
        let mut providers: HashMap<ProviderName, Arc<dyn OAuthProvider>> = HashMap::new();

        for (name, entry) in &config.entries {
            if !entry.is_enabled() {
                debug!(provider = %name, "Skipping provider without client key");
                continue;
            }
            let external = name
                .external()
                .ok_or_else(|| ProviderError::InvalidProvider(name.to_string()))?;
            let provider = external.build(entry).map_err(|e| {
                warn!(provider = %name, error = %e, "Provider load failed");
                e
            })?;
            providers.insert(name.clone(), provider);
        }

        let mut state = self.state.write().await;
        state.internal = config.internal.clone();
        state.providers = providers;

        info!(
            count = state.providers.len(),
            internal = %state.internal,
            "Providers loaded"
        );
        Ok(())
    }

    /// Register capabilities by their own name; last write wins
    pub async fn use_providers<I>(&self, providers: I)
    where
        I: IntoIterator<Item = Arc<dyn OAuthProvider>>,
    {
        let mut state = self.state.write().await;
        for provider in providers {
            debug!(provider = %provider.name(), "Registering provider");
            state.providers.insert(provider.name().clone(), provider);
        }
    }

    pub async fn get_provider(&self, name: &ProviderName) -> Result<Arc<dyn OAuthProvider>> {
        if !name.is_external() {
            return Err(ProviderError::InvalidProvider(name.to_string()));
        }
        self.state
            .read()
            .await
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::ProviderNotConfigured(name.to_string()))
    }

    /// Ok for the internal provider or any registered external one
    pub async fn is_enabled(&self, name: &ProviderName) -> Result<()> {
        if name.is_unknown() {
            return Err(ProviderError::InvalidProvider(String::new()));
        }
        if *name == self.state.read().await.internal {
            return Ok(());
        }
        self.get_provider(name).await.map(|_| ())
    }

    pub async fn internal(&self) -> ProviderName {
        self.state.read().await.internal.clone()
    }

    /// Registered provider names, sorted
    pub async fn names(&self) -> Vec<ProviderName> {
        let mut names: Vec<_> = self.state.read().await.providers.keys().cloned().collect();
        names.sort();
        names
    }
}
