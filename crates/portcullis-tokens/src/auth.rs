//! Single-use auth tokens.
//!
//! An auth token is the OAuth `state` value of one exchange. It is created
//! with the provider it belongs to, gets the provider session attached once,
//! and is redeemed exactly once. Callers must look the token up with
//! [`get_auth_token`] and redeem it with [`use_token`] in the same
//! transaction: the row lock taken by the lookup is what serializes
//! concurrent redeemers.

use crate::{
    errors::{Result, TokenError},
    random::{secure_token, token_hash_for_log},
};
use portcullis_jwt::current_timestamp;
use portcullis_storage::{Transaction, TransactionExt, CF_AUTH_TOKENS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub provider: String,
    pub data: BTreeMap<String, String>,
    pub created_at: u64,
    /// `None` never expires
    pub expires_at: Option<u64>,
    pub used: bool,
    pub used_at: Option<u64>,
}

impl AuthToken {
    fn new(provider: &str, ttl: u64) -> Self {
        let now = current_timestamp();
        Self {
            token: secure_token(),
            provider: provider.to_string(),
            data: BTreeMap::new(),
            created_at: now,
            expires_at: (ttl > 0).then(|| now + ttl),
            used: false,
            used_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| current_timestamp() >= expires_at)
    }

    /// Serialized provider session, once attached
    pub fn session(&self) -> Option<&str> {
        self.data.get(SESSION_KEY).map(String::as_str)
    }
}

/// Create and store a fresh token for `provider`.
///
/// `ttl` is in seconds; zero means no expiry. A collision on the random
/// value surfaces as `StorageError::AlreadyExists` and may be retried.
pub async fn grant_auth_token(
    tx: &mut dyn Transaction,
    provider: &str,
    ttl: u64,
) -> Result<AuthToken> {
    let token = AuthToken::new(provider, ttl);
    tx.insert(CF_AUTH_TOKENS, token.token.as_str(), &token).await?;

    debug!(
        provider = %provider,
        token_hash = %token_hash_for_log(&token.token),
        expires_at = ?token.expires_at,
        "Auth token granted"
    );
    Ok(token)
}

/// Lock and load a redeemable token
pub async fn get_auth_token(tx: &mut dyn Transaction, token: &str) -> Result<AuthToken> {
    if token.is_empty() {
        return Err(TokenError::TokenNotFound);
    }

    let record: AuthToken = tx
        .get_for_update(CF_AUTH_TOKENS, token)
        .await?
        .ok_or(TokenError::TokenNotFound)?;

    if record.is_expired() {
        warn!(
            provider = %record.provider,
            token_hash = %token_hash_for_log(token),
            "Auth token expired"
        );
        return Err(TokenError::TokenExpired);
    }
    if record.used {
        warn!(
            provider = %record.provider,
            token_hash = %token_hash_for_log(token),
            "Auth token already used"
        );
        return Err(TokenError::TokenAlreadyUsed);
    }
    Ok(record)
}

/// Store the serialized provider session on the token
pub fn attach_session(
    tx: &mut dyn Transaction,
    token: &mut AuthToken,
    session: String,
) -> Result<()> {
    token.data.insert(SESSION_KEY.to_string(), session);
    tx.put(CF_AUTH_TOKENS, token.token.as_str(), &*token)?;
    Ok(())
}

/// Burn the token. Visible to other transactions only after commit.
pub fn use_token(tx: &mut dyn Transaction, token: &mut AuthToken) -> Result<()> {
    if token.used {
        return Err(TokenError::TokenAlreadyUsed);
    }
    token.used = true;
    token.used_at = Some(current_timestamp());
    tx.put(CF_AUTH_TOKENS, token.token.as_str(), &*token)?;
    Ok(())
}
