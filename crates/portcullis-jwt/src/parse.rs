//! Verification and parsing.

use crate::{
    claims::{StandardClaims, UserClaims, WebhookClaims},
    config::JwtConfig,
    errors::{JwtError, Result},
    keys,
};
use jsonwebtoken::{decode, Validation};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Claims the JWT registry reserves; everything else is private
const REGISTERED_CLAIMS: [&str; 7] = ["iss", "sub", "aud", "exp", "nbf", "iat", "jti"];

/// Verify `token` and decode it into a claim variant.
///
/// Fails with [`JwtError::InvalidSubject`] when the subject is empty.
pub fn parse_claims<C>(config: &JwtConfig, token: &str) -> Result<C>
where
    C: DeserializeOwned + AsRef<StandardClaims>,
{
    let claims: C = serde_json::from_value(Value::Object(verify(config, token)?))?;
    if claims.as_ref().sub.is_empty() {
        return Err(JwtError::InvalidSubject);
    }
    Ok(claims)
}

pub fn parse_user_claims(config: &JwtConfig, token: &str) -> Result<UserClaims> {
    parse_claims(config, token)
}

pub fn parse_webhook_claims(config: &JwtConfig, token: &str) -> Result<WebhookClaims> {
    parse_claims(config, token)
}

/// Verify `token` and return its private claims. No subject is required.
pub fn parse_data(config: &JwtConfig, token: &str) -> Result<Map<String, Value>> {
    let mut claims = verify(config, token)?;
    claims.retain(|name, _| !REGISTERED_CLAIMS.contains(&name.as_str()));
    Ok(claims)
}

/// Signature, issuer, expiration, then every configured audience entry
fn verify(config: &JwtConfig, token: &str) -> Result<Map<String, Value>> {
    let (algorithm, key) = keys::verifying_key(config)?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;
    if !config.issuer.is_empty() {
        validation.set_issuer(&[config.issuer.as_str()]);
    }

    let claims = decode::<Map<String, Value>>(token, &key, &validation)
        .map_err(|e| {
            debug!(error = %e, "Token rejected");
            JwtError::from(e)
        })?
        .claims;

    let presented = audience_of(&claims);
    if let Some(missing) = config
        .audiences()
        .into_iter()
        .find(|expected| !presented.contains(expected))
    {
        return Err(JwtError::ClaimValidationFailed(format!(
            "audience {} not present",
            missing
        )));
    }

    Ok(claims)
}

fn audience_of(claims: &Map<String, Value>) -> Vec<String> {
    match claims.get("aud") {
        Some(Value::String(aud)) => vec![aud.clone()],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
