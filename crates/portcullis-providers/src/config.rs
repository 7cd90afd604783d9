//! Provider registration entries.

use crate::name::ProviderName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OAuth client registration for one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub client_key: String,
    pub secret: String,
    pub callback_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Tenant, domain, discovery URL, or custom host
    #[serde(default)]
    pub url: Option<String>,
}

impl ProviderEntry {
    pub fn new(
        client_key: impl Into<String>,
        secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_key: client_key.into(),
            secret: secret.into(),
            callback_url: callback_url.into(),
            ..Default::default()
        }
    }

    /// Entries without a client key are ignored at load time
    pub fn is_enabled(&self) -> bool {
        !self.client_key.trim().is_empty()
    }
}

/// Snapshot consumed by [`crate::ProviderRegistry::load_providers`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidersConfig {
    /// Built-in email/password provider, or unknown when disabled
    pub internal: ProviderName,
    pub entries: BTreeMap<ProviderName, ProviderEntry>,
}

impl ProvidersConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the built-in provider named after the service
    pub fn with_internal(mut self, service_name: &str) -> Self {
        self.internal = ProviderName::internal(service_name);
        self
    }

    pub fn with_entry(mut self, name: impl Into<ProviderName>, entry: ProviderEntry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }
}
