//! OAuth exchange orchestrator.

use crate::errors::{ExchangeError, Result};
use portcullis_providers::{
    CallbackData, ExternalUser, ProviderName, ProviderRegistry, ProviderSession,
};
use portcullis_storage::Storage;
use portcullis_tokens::{
    attach_session, get_auth_token, grant_auth_token, token_hash_for_log, use_token,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Redirect target and the state token embedded in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUrl {
    pub url: String,
    pub token: String,
}

pub struct OAuthExchange<S: Storage> {
    storage: Arc<S>,
    registry: Arc<ProviderRegistry>,
}

impl<S: Storage> OAuthExchange<S> {
    pub fn new(storage: Arc<S>, registry: Arc<ProviderRegistry>) -> Self {
        Self { storage, registry }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Start an exchange with `provider`.
    ///
    /// `ttl` bounds how long the returned token can be redeemed, in seconds;
    /// zero never expires. If the provider cannot start the flow, no token
    /// is left behind.
    pub async fn grant_auth_url(&self, provider: &ProviderName, ttl: u64) -> Result<AuthUrl> {
        let capability = self.registry.get_provider(provider).await?;

        let mut tx = self.storage.begin_transaction().await?;
        let mut token = grant_auth_token(tx.as_mut(), provider.as_str(), ttl).await?;

        let session = capability.begin_auth(&token.token).await.map_err(|e| {
            warn!(provider = %provider, error = %e, "Provider could not start authorization");
            e
        })?;
        attach_session(tx.as_mut(), &mut token, session.marshal()?)?;
        tx.commit().await?;

        info!(
            provider = %provider,
            token_hash = %token_hash_for_log(&token.token),
            "Auth URL granted"
        );
        Ok(AuthUrl {
            url: session.auth_url,
            token: token.token,
        })
    }

    /// Complete the exchange identified by `state`.
    ///
    /// The token is marked used only if the provider exchange and profile
    /// fetch both succeed; otherwise it stays redeemable.
    pub async fn authorize_user(&self, state: &str, data: &CallbackData) -> Result<ExternalUser> {
        let mut tx = self.storage.begin_transaction().await?;
        let mut token = get_auth_token(tx.as_mut(), state).await?;

        let provider = ProviderName::new(&token.provider);
        let capability = self.registry.get_provider(&provider).await?;

        let raw = token
            .session()
            .ok_or_else(|| ExchangeError::InvalidSession("no session attached".to_string()))?;
        let mut session = ProviderSession::unmarshal(raw)
            .map_err(|e| ExchangeError::InvalidSession(e.to_string()))?;

        if let Err(e) = capability.authorize(&mut session, data).await {
            warn!(
                provider = %provider,
                token_hash = %token_hash_for_log(state),
                error = %e,
                "Provider authorization failed"
            );
            return Err(e.into());
        }
        let user = capability.fetch_user(&session).await?;

        use_token(tx.as_mut(), &mut token)?;
        tx.commit().await?;

        info!(
            provider = %provider,
            external_id = %user.user_id,
            "External user authorized"
        );
        Ok(user)
    }

    /// Whether `name` can be used to sign in
    pub async fn is_enabled(&self, name: &ProviderName) -> Result<()> {
        Ok(self.registry.is_enabled(name).await?)
    }
}
