//! Generic OAuth 2.0 authorization-code capability.

use crate::{
    config::ProviderEntry,
    errors::{ProviderError, Result},
    external::ProviderSpec,
    name::ProviderName,
    traits::{CallbackData, ExternalUser, OAuthProvider, ProviderSession},
};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::Deserialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

const ID_FIELDS: &[&str] = &["id", "sub", "account_id", "uuid", "userId", "user_id"];
const EMAIL_FIELDS: &[&str] = &["email", "mail"];
const NAME_FIELDS: &[&str] = &["name", "display_name", "displayName", "login", "username"];
const AVATAR_FIELDS: &[&str] = &[
    "picture",
    "avatar_url",
    "avatar",
    "pictureUrl",
    "profile_image_url",
];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

/// Authorization-code flow against a provider's endpoint table
pub struct OAuth2Provider {
    name: ProviderName,
    client_key: String,
    secret: String,
    callback_url: String,
    scopes: Vec<String>,
    spec: OnceCell<ProviderSpec>,
    discovery_url: Option<String>,
    discovery_scopes: &'static [&'static str],
    http_client: Client,
}

impl OAuth2Provider {
    /// Provider with fixed endpoints
    pub fn new(name: ProviderName, entry: &ProviderEntry, spec: ProviderSpec) -> Result<Self> {
        validate_url("callback URL", &entry.callback_url)?;
        validate_url("auth URL", &spec.auth_url)?;

        Ok(Self {
            name,
            client_key: entry.client_key.clone(),
            secret: entry.secret.clone(),
            callback_url: entry.callback_url.clone(),
            scopes: entry.scopes.clone(),
            spec: OnceCell::new_with(Some(spec)),
            discovery_url: None,
            discovery_scopes: &[],
            http_client: Client::new(),
        })
    }

    /// Provider whose endpoints come from an OpenID discovery document on
    /// first use
    pub fn discover(
        name: ProviderName,
        entry: &ProviderEntry,
        discovery_url: &str,
        extra_scopes: &'static [&'static str],
    ) -> Result<Self> {
        validate_url("callback URL", &entry.callback_url)?;
        validate_url("discovery URL", discovery_url)?;

        Ok(Self {
            name,
            client_key: entry.client_key.clone(),
            secret: entry.secret.clone(),
            callback_url: entry.callback_url.clone(),
            scopes: entry.scopes.clone(),
            spec: OnceCell::new(),
            discovery_url: Some(discovery_url.to_string()),
            discovery_scopes: extra_scopes,
            http_client: Client::new(),
        })
    }

    async fn spec(&self) -> Result<&ProviderSpec> {
        self.spec.get_or_try_init(|| self.fetch_discovery()).await
    }

    async fn fetch_discovery(&self) -> Result<ProviderSpec> {
        let url = self
            .discovery_url
            .as_deref()
            .ok_or_else(|| ProviderError::Discovery("no discovery URL".to_string()))?;

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Discovery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Discovery(format!(
                "status {}",
                response.status()
            )));
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| ProviderError::Discovery(e.to_string()))?;

        debug!(provider = %self.name, "Resolved OpenID endpoints");

        Ok(ProviderSpec {
            auth_url: document.authorization_endpoint,
            token_url: document.token_endpoint,
            user_info_url: document.userinfo_endpoint,
            extra_scopes: self.discovery_scopes,
            profile_pointer: None,
            client_id_header: false,
        })
    }

    /// Configured scopes followed by the provider's required ones
    fn scopes(&self, spec: &ProviderSpec) -> Vec<String> {
        let mut scopes = self.scopes.clone();
        for extra in spec.extra_scopes {
            if !scopes.iter().any(|scope| scope == extra) {
                scopes.push(extra.to_string());
            }
        }
        scopes
    }

    /// Build authorization URL
    pub fn build_auth_url(&self, spec: &ProviderSpec, state: &str) -> Result<String> {
        let mut url = Url::parse(&spec.auth_url)
            .map_err(|e| ProviderError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_key)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes(spec).join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn exchange_code(&self, spec: &ProviderSpec, code: &str) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("client_id", self.client_key.as_str()),
            ("client_secret", self.secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&spec.token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Exchange(format!(
                "status {}: {}",
                status, body
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Exchange(format!("Failed to parse token response: {}", e)))?;

        // Some providers report errors with a 200
        if let Some(error) = json.get("error") {
            return Err(ProviderError::Exchange(error.to_string()));
        }

        Ok(serde_json::from_value(json)?)
    }

    async fn get_user_info(&self, spec: &ProviderSpec, access_token: &str) -> Result<Value> {
        let mut request = self
            .http_client
            .get(&spec.user_info_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json");
        if spec.client_id_header {
            request = request.header("Client-Id", &self.client_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UserInfo(format!(
                "status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::UserInfo(format!("Failed to parse user info: {}", e)))
    }
}

#[async_trait]
impl OAuthProvider for OAuth2Provider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    async fn begin_auth(&self, state: &str) -> Result<ProviderSession> {
        let spec = self.spec().await?;
        let url = self.build_auth_url(spec, state)?;
        Ok(ProviderSession::new(url, state))
    }

    async fn authorize(&self, session: &mut ProviderSession, params: &CallbackData) -> Result<()> {
        if let Some(error) = params.get("error") {
            let reason = params.get("error_description").unwrap_or(error);
            return Err(ProviderError::AccessDenied(reason.to_string()));
        }
        if let Some(state) = params.get("state") {
            if state != session.state {
                return Err(ProviderError::StateMismatch);
            }
        }
        let code = params.get("code").ok_or(ProviderError::MissingCode)?;

        let spec = self.spec().await?;
        let token = self.exchange_code(spec, code).await?;

        session.access_token = Some(token.access_token);
        session.refresh_token = token.refresh_token;
        session.id_token = token.id_token;
        session.expires_at = token.expires_in.map(|seconds| now() + seconds);
        Ok(())
    }

    async fn fetch_user(&self, session: &ProviderSession) -> Result<ExternalUser> {
        let access_token = session
            .access_token
            .as_deref()
            .ok_or(ProviderError::NotAuthorized)?;

        let spec = self.spec().await?;
        let json = self.get_user_info(spec, access_token).await?;

        let mut user = map_profile(&self.name, &json, spec.profile_pointer)?;
        user.access_token = session.access_token.clone();
        user.refresh_token = session.refresh_token.clone();
        user.expires_at = session.expires_at;
        Ok(user)
    }
}

/// Map a user info response onto [`ExternalUser`].
///
/// Field names vary by provider, so the first present candidate wins.
pub(crate) fn map_profile(
    provider: &ProviderName,
    json: &Value,
    pointer: Option<&str>,
) -> Result<ExternalUser> {
    let profile = match pointer {
        Some(pointer) => json.pointer(pointer).unwrap_or(json),
        None => json,
    };
    let fields = profile
        .as_object()
        .ok_or_else(|| ProviderError::UserInfo("profile is not an object".to_string()))?;

    let user_id = first_string(fields, ID_FIELDS)
        .ok_or_else(|| ProviderError::UserInfo("Missing user ID".to_string()))?;

    Ok(ExternalUser {
        provider: provider.clone(),
        user_id,
        email: first_string(fields, EMAIL_FIELDS),
        name: first_string(fields, NAME_FIELDS),
        avatar_url: first_string(fields, AVATAR_FIELDS),
        raw: fields.clone(),
        ..Default::default()
    })
}

fn first_string(fields: &serde_json::Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| match fields.get(*key) {
        Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

fn validate_url(what: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ProviderError::InvalidConfig(format!("Invalid {} {:?}: {}", what, value, e)))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
