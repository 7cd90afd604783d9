//! JWT codec errors.

#![warn(missing_docs)]

use jsonwebtoken::errors::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from signing or parsing tokens
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signature does not verify against the configured key
    #[error("Signature invalid")]
    SignatureInvalid,

    /// Issuer, audience, or time-based claim check failed
    #[error("Claim validation failed: {0}")]
    ClaimValidationFailed(String),

    /// Expiration is in the past
    #[error("Token expired")]
    TokenExpired,

    /// Subject claim is empty
    #[error("Invalid subject")]
    InvalidSubject,

    /// Subject is reserved and cannot be issued
    #[error("Reserved subject: {0}")]
    ReservedSubject(String),

    /// Key material does not belong to the configured algorithm family
    #[error("Key/algorithm mismatch: {algorithm} cannot use {key}")]
    KeyAlgorithmMismatch {
        /// Configured algorithm
        algorithm: String,
        /// Kind of key that was resolved
        key: String,
    },

    /// Neither a secret nor a private key is configured
    #[error("No signing key configured")]
    MissingKey,

    /// Key file could not be read
    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Algorithm name is not recognized
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Token is not a well-formed compact JWS
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Claims could not be converted
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => JwtError::SignatureInvalid,
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => {
                JwtError::ClaimValidationFailed(err.to_string())
            }
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                JwtError::KeyAlgorithmMismatch {
                    algorithm: "token header".to_string(),
                    key: "configured key".to_string(),
                }
            }
            _ => JwtError::MalformedToken(err.to_string()),
        }
    }
}

/// Result type for JWT operations
pub type Result<T> = std::result::Result<T, JwtError>;
