//! Bearer credential issuance and refresh-token rotation.

use crate::{
    errors::{Result, TokenError},
    random::{secure_token, sha256, token_hash_for_log},
    user::UserSnapshot,
};
use portcullis_jwt::{current_timestamp, JwtConfig, Token, SUPER_ADMIN_ID};
use portcullis_storage::{
    traits::deserialize_value, Storage, Transaction, TransactionExt, CF_REFRESH_TOKENS,
    CF_REFRESH_TOKENS_BY_USER,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 30 days
pub const DEFAULT_REFRESH_TOKEN_TTL: u64 = 2_592_000;

const TOKEN_TYPE: &str = "Bearer";

/// Access/refresh pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    /// Signed JWT. Never stored.
    pub access_token: String,
    /// Opaque. Stored only as its hash.
    pub refresh_token: String,
    pub user_id: Uuid,
    pub token_type: String,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationReason {
    /// Exchanged for a new pair
    Rotated,
    Logout,
    /// Revoked because a rotated sibling was presented again
    Reuse,
}

/// Refresh token record stored in database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub token_hash: [u8; 32],
    pub user_id: Uuid,
    pub created_at: u64,
    pub expires_at: Option<u64>,
    pub revoked: bool,
    pub revoked_at: Option<u64>,
    pub revoked_reason: Option<RevocationReason>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| current_timestamp() >= expires_at)
    }

    pub fn is_usable(&self) -> bool {
        !self.revoked && !self.is_expired()
    }

    fn revoke(&mut self, reason: RevocationReason) {
        self.revoked = true;
        self.revoked_at = Some(current_timestamp());
        self.revoked_reason = Some(reason);
    }
}

/// What happens when an already rotated refresh token is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReusePolicy {
    /// Reject the presented token only
    #[default]
    RejectToken,
    /// Also revoke every outstanding refresh token of the user
    RevokeAll,
}

/// Issues and rotates bearer credentials.
///
/// Each operation is one storage transaction. Refresh and logout lock the
/// user's index row before any refresh-token row.
pub struct CredentialIssuer<S: Storage> {
    storage: Arc<S>,
    jwt: JwtConfig,
    refresh_token_ttl: u64,
    reuse_policy: ReusePolicy,
}

impl<S: Storage> CredentialIssuer<S> {
    pub fn new(storage: Arc<S>, jwt: JwtConfig) -> Self {
        Self {
            storage,
            jwt,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            reuse_policy: ReusePolicy::default(),
        }
    }

    /// Refresh token lifetime in seconds; zero never expires
    pub fn with_refresh_token_ttl(mut self, seconds: u64) -> Self {
        self.refresh_token_ttl = seconds;
        self
    }

    pub fn with_reuse_policy(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Issue a fresh pair for `user`
    pub async fn grant_bearer_token(&self, user: &UserSnapshot) -> Result<BearerToken> {
        check_user(user)?;

        let mut tx = self.storage.begin_transaction().await?;
        tx.lock(CF_REFRESH_TOKENS_BY_USER, &user.id).await?;
        let bearer = self.issue(tx.as_mut(), user).await?;
        tx.commit().await?;

        info!(
            user_id = %user.id,
            provider = %user.provider,
            expires_at = ?bearer.expires_at,
            "Bearer token granted"
        );
        Ok(bearer)
    }

    /// Exchange `refresh_token` for a new pair reflecting `user` as it is now.
    ///
    /// The presented token is revoked in the same transaction that stores
    /// its replacement.
    pub async fn refresh_bearer_token(
        &self,
        user: &UserSnapshot,
        refresh_token: &str,
    ) -> Result<BearerToken> {
        check_user(user)?;
        if refresh_token.is_empty() {
            return Err(TokenError::TokenNotFound);
        }
        let token_hash = sha256(refresh_token.as_bytes());

        let mut tx = self.storage.begin_transaction().await?;
        tx.lock(CF_REFRESH_TOKENS_BY_USER, &user.id).await?;

        let mut record: RefreshTokenRecord = tx
            .get_for_update(CF_REFRESH_TOKENS, &token_hash)
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        if record.user_id != user.id {
            warn!(
                user_id = %user.id,
                token_hash = %token_hash_for_log(refresh_token),
                "Refresh token presented by another user"
            );
            return Err(TokenError::TokenNotFound);
        }

        if record.revoked {
            warn!(
                user_id = %user.id,
                token_hash = %token_hash_for_log(refresh_token),
                reason = ?record.revoked_reason,
                "Refresh token reuse detected"
            );
            tx.rollback();
            if self.reuse_policy == ReusePolicy::RevokeAll {
                let revoked = self.revoke_all(user.id, RevocationReason::Reuse).await?;
                warn!(user_id = %user.id, revoked, "Revoked outstanding refresh tokens after reuse");
            }
            return Err(TokenError::RefreshTokenRevoked);
        }

        if record.is_expired() {
            warn!(
                user_id = %user.id,
                token_hash = %token_hash_for_log(refresh_token),
                "Refresh token expired"
            );
            return Err(TokenError::TokenExpired);
        }

        record.revoke(RevocationReason::Rotated);
        tx.put(CF_REFRESH_TOKENS, &token_hash, &record)?;

        let bearer = self.issue(tx.as_mut(), user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "Refresh token rotated");
        Ok(bearer)
    }

    /// Revoke every outstanding refresh token of the user.
    ///
    /// Access tokens already issued stay valid until they expire. Returns
    /// the number of tokens revoked.
    pub async fn logout(&self, user_id: Uuid) -> Result<usize> {
        let revoked = self.revoke_all(user_id, RevocationReason::Logout).await?;
        info!(user_id = %user_id, revoked, "User logged out");
        Ok(revoked)
    }

    /// True if the user holds an unrevoked, unexpired refresh token
    pub async fn has_usable_refresh_token(&self, user_id: Uuid) -> Result<bool> {
        let mut tx = self.storage.begin_transaction().await?;
        let mut usable = false;
        for token_hash in user_token_hashes(tx.as_mut(), user_id).await? {
            let record: Option<RefreshTokenRecord> =
                tx.get(CF_REFRESH_TOKENS, &token_hash).await?;
            if record.is_some_and(|record| record.is_usable()) {
                usable = true;
                break;
            }
        }
        tx.rollback();
        Ok(usable)
    }

    async fn revoke_all(&self, user_id: Uuid, reason: RevocationReason) -> Result<usize> {
        let mut tx = self.storage.begin_transaction().await?;
        tx.lock(CF_REFRESH_TOKENS_BY_USER, &user_id).await?;

        let mut revoked = 0;
        for token_hash in user_token_hashes(tx.as_mut(), user_id).await? {
            let record: Option<RefreshTokenRecord> =
                tx.get_for_update(CF_REFRESH_TOKENS, &token_hash).await?;
            let Some(mut record) = record else {
                continue;
            };
            if record.revoked {
                continue;
            }
            record.revoke(reason);
            tx.put(CF_REFRESH_TOKENS, &token_hash, &record)?;
            revoked += 1;
        }

        tx.commit().await?;
        Ok(revoked)
    }

    /// Sign an access token and store a new refresh token inside `tx`
    async fn issue(&self, tx: &mut dyn Transaction, user: &UserSnapshot) -> Result<BearerToken> {
        let token = Token::new(&self.jwt, user.claims()?);
        let access_token = token.bearer()?;

        let refresh_token = secure_token();
        let token_hash = sha256(refresh_token.as_bytes());
        let now = current_timestamp();
        let record = RefreshTokenRecord {
            token_hash,
            user_id: user.id,
            created_at: now,
            expires_at: (self.refresh_token_ttl > 0).then(|| now + self.refresh_token_ttl),
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
        };

        tx.insert(CF_REFRESH_TOKENS, &token_hash, &record).await?;
        tx.put(CF_REFRESH_TOKENS_BY_USER, &(user.id, token_hash), &())?;

        Ok(BearerToken {
            access_token,
            refresh_token,
            user_id: user.id,
            token_type: TOKEN_TYPE.to_string(),
            expires_at: token.expires_at(),
        })
    }
}

fn check_user(user: &UserSnapshot) -> Result<()> {
    if user.id.is_nil() || user.id == SUPER_ADMIN_ID {
        return Err(TokenError::InvalidUser(user.id));
    }
    if !user.is_active() && !user.is_restricted() {
        return Err(TokenError::InactiveUser(user.id));
    }
    Ok(())
}

/// Hashes indexed under `user_id`, including revoked ones
async fn user_token_hashes(tx: &mut dyn Transaction, user_id: Uuid) -> Result<Vec<[u8; 32]>> {
    let entries: Vec<(Vec<u8>, ())> = tx.scan_prefix(CF_REFRESH_TOKENS_BY_USER, &user_id).await?;
    entries
        .into_iter()
        .map(|(key, ())| -> Result<[u8; 32]> {
            let (_, token_hash): (Uuid, [u8; 32]) = deserialize_value(&key)?;
            Ok(token_hash)
        })
        .collect()
}
