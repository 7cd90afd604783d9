//! Provider capability trait and the values it exchanges.

use crate::{errors::Result, name::ProviderName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Operations any OAuth backend implements to plug into the exchange
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &ProviderName;

    /// Start an authorization using `state` as the OAuth state parameter.
    ///
    /// The returned session carries the redirect URL.
    async fn begin_auth(&self, state: &str) -> Result<ProviderSession>;

    /// Complete the provider-specific code exchange
    async fn authorize(&self, session: &mut ProviderSession, params: &CallbackData) -> Result<()>;

    /// Fetch the profile of the user who authorized `session`
    async fn fetch_user(&self, session: &ProviderSession) -> Result<ExternalUser>;
}

/// In-flight exchange state, persisted as JSON inside the auth token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub auth_url: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Backend-specific values, e.g. a PKCE verifier
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ProviderSession {
    pub fn new(auth_url: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            state: state.into(),
            ..Default::default()
        }
    }

    pub fn marshal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn unmarshal(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Query parameters the provider sent to the callback URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackData(BTreeMap<String, String>);

impl CallbackData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Profile reported by an external provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUser {
    pub provider: ProviderName,
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<u64>,
    /// Unmapped profile fields
    #[serde(default)]
    pub raw: Map<String, Value>,
}
