//! JWT configuration snapshot.

use crate::errors::{JwtError, Result};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};

/// Default signing algorithm when none is configured
pub const DEFAULT_ALGORITHM: &str = "HS256";

/// Signing and validation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared HMAC secret. Takes precedence over PEM keys when set.
    pub secret: String,

    /// PEM private key
    pub private_key_path: Option<PathBuf>,

    /// PEM public key; defaults to `<private_key_path>.pub`
    pub public_key_path: Option<PathBuf>,

    /// JWA name, e.g. `HS256`, `RS512`, `ES256`, `EdDSA`
    pub algorithm: String,

    pub issuer: String,

    /// Comma separated
    pub audience: String,

    /// Comma separated default scopes
    pub scope: String,

    /// Access token lifetime in seconds; 0 means no `exp` claim
    pub expiration: u64,
}

impl JwtConfig {
    /// Fill defaults that depend on the service identity
    pub fn normalize(&mut self, service_name: &str) {
        if self.issuer.is_empty() {
            self.issuer = service_name.to_lowercase();
        }
        if self.algorithm.is_empty() {
            self.algorithm = DEFAULT_ALGORITHM.to_string();
        }
    }

    /// Check that key material is present and readable
    pub fn check_required(&self) -> Result<()> {
        self.algorithm()?;
        if !self.secret.is_empty() {
            return Ok(());
        }
        let private_key = self.private_key_path.as_ref().ok_or(JwtError::MissingKey)?;
        for path in [Some(private_key), self.public_key_path.as_ref()]
            .into_iter()
            .flatten()
        {
            std::fs::metadata(path).map_err(|source| JwtError::KeyFile {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn algorithm(&self) -> Result<Algorithm> {
        let name = if self.algorithm.is_empty() {
            DEFAULT_ALGORITHM
        } else {
            self.algorithm.as_str()
        };
        Algorithm::from_str(name).map_err(|_| JwtError::UnsupportedAlgorithm(name.to_string()))
    }

    /// Configured audience entries
    pub fn audiences(&self) -> Vec<String> {
        split_list(&self.audience)
    }

    /// Configured default scopes
    pub fn scopes(&self) -> Vec<String> {
        split_list(&self.scope)
    }

    /// Public key path, falling back to `<private_key_path>.pub`
    pub fn resolved_public_key_path(&self) -> Option<PathBuf> {
        self.public_key_path.clone().or_else(|| {
            self.private_key_path.as_ref().map(|path| {
                let mut with_suffix = path.clone().into_os_string();
                with_suffix.push(".pub");
                PathBuf::from(with_suffix)
            })
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
