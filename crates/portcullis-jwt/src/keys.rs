//! Key resolution.
//!
//! A configured secret is an HMAC key and only pairs with `HS*`. PEM keys
//! are parsed according to the algorithm family, so an RSA key configured
//! for `ES256` fails here instead of producing an unverifiable token.

use crate::{
    config::JwtConfig,
    errors::{JwtError, Result},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use std::path::Path;

type PemParser<K> = fn(&[u8]) -> jsonwebtoken::errors::Result<K>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl Family {
    fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Family::Hmac,
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => Family::Rsa,
            Algorithm::ES256 | Algorithm::ES384 => Family::Ec,
            Algorithm::EdDSA => Family::Ed,
        }
    }

    fn pem_kind(self) -> &'static str {
        match self {
            Family::Hmac => "a PEM key",
            Family::Rsa => "an RSA PEM key",
            Family::Ec => "an EC PEM key",
            Family::Ed => "an Ed25519 PEM key",
        }
    }
}

pub(crate) fn signing_key(config: &JwtConfig) -> Result<(Algorithm, EncodingKey)> {
    let algorithm = config.algorithm()?;
    let family = Family::of(algorithm);

    if !config.secret.is_empty() {
        if family != Family::Hmac {
            return Err(mismatch(algorithm, "a shared secret"));
        }
        return Ok((algorithm, EncodingKey::from_secret(config.secret.as_bytes())));
    }

    let path = config.private_key_path.as_deref().ok_or(JwtError::MissingKey)?;
    let parse: PemParser<EncodingKey> = match family {
        Family::Hmac => return Err(mismatch(algorithm, family.pem_kind())),
        Family::Rsa => EncodingKey::from_rsa_pem,
        Family::Ec => EncodingKey::from_ec_pem,
        Family::Ed => EncodingKey::from_ed_pem,
    };
    let key = parse(&read_key(path)?)
        .map_err(|_| mismatch(algorithm, "the configured private key"))?;

    Ok((algorithm, key))
}

pub(crate) fn verifying_key(config: &JwtConfig) -> Result<(Algorithm, DecodingKey)> {
    let algorithm = config.algorithm()?;
    let family = Family::of(algorithm);

    if !config.secret.is_empty() {
        if family != Family::Hmac {
            return Err(mismatch(algorithm, "a shared secret"));
        }
        return Ok((algorithm, DecodingKey::from_secret(config.secret.as_bytes())));
    }

    let path = config
        .resolved_public_key_path()
        .ok_or(JwtError::MissingKey)?;
    let parse: PemParser<DecodingKey> = match family {
        Family::Hmac => return Err(mismatch(algorithm, family.pem_kind())),
        Family::Rsa => DecodingKey::from_rsa_pem,
        Family::Ec => DecodingKey::from_ec_pem,
        Family::Ed => DecodingKey::from_ed_pem,
    };
    let key = parse(&read_key(&path)?)
        .map_err(|_| mismatch(algorithm, "the configured public key"))?;

    Ok((algorithm, key))
}

fn read_key(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| JwtError::KeyFile {
        path: path.to_path_buf(),
        source,
    })
}

fn mismatch(algorithm: Algorithm, key: &str) -> JwtError {
    JwtError::KeyAlgorithmMismatch {
        algorithm: format!("{:?}", algorithm),
        key: key.to_string(),
    }
}
