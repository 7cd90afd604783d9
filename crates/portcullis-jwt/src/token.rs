//! Token construction and signing.

use crate::{
    claims::{Claims, StandardClaims},
    config::JwtConfig,
    errors::Result,
    keys,
};
use jsonwebtoken::{encode, Header};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Claims stamped with the configured issuer, audience, lifetime, and scope
#[derive(Debug, Clone)]
pub struct Token {
    config: JwtConfig,
    claims: Claims,
}

impl Token {
    /// Stamp `claims` from `config`.
    ///
    /// Scope from the configuration is applied only when the claims carry
    /// none of their own.
    pub fn new(config: &JwtConfig, claims: impl Into<Claims>) -> Self {
        let mut claims = claims.into();
        stamp(config, claims.standard_mut());
        Self {
            config: config.clone(),
            claims,
        }
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Unix time after which the token is rejected
    pub fn expires_at(&self) -> Option<u64> {
        self.claims.standard().exp
    }

    /// Configured lifetime in seconds, 0 when tokens do not expire
    pub fn expiration(&self) -> u64 {
        self.config.expiration
    }

    /// Sign and return the compact JWS
    pub fn bearer(&self) -> Result<String> {
        let (algorithm, key) = keys::signing_key(&self.config)?;
        Ok(encode(&Header::new(algorithm), &self.claims, &key)?)
    }
}

/// Sign arbitrary private claims without a subject.
///
/// Registered claims in `data` are overwritten by the configuration.
pub fn new_signed_data(config: &JwtConfig, data: Map<String, Value>) -> Result<String> {
    let mut standard = StandardClaims::default();
    stamp(config, &mut standard);

    let mut payload = data;
    if let Value::Object(registered) = serde_json::to_value(&standard)? {
        payload.extend(registered);
    }

    let (algorithm, key) = keys::signing_key(config)?;
    Ok(encode(&Header::new(algorithm), &payload, &key)?)
}

fn stamp(config: &JwtConfig, standard: &mut StandardClaims) {
    standard.iss = config.issuer.clone();
    standard.iat = current_timestamp();
    let audiences = config.audiences();
    if !audiences.is_empty() {
        standard.aud = audiences;
    }
    standard.exp = (config.expiration > 0).then(|| standard.iat + config.expiration);
    if standard.scope.is_empty() {
        standard.scope = config.scopes();
    }
}
