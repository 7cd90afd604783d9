//! Provider error types.

#![warn(missing_docs)]

use thiserror::Error;

/// Errors from provider resolution and OAuth exchanges
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Name is the unknown sentinel, outside the external allow-list, or
    /// cannot be built from configuration
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    /// Name is allowed but nothing is registered under it
    #[error("no provider for {0} exists")]
    ProviderNotConfigured(String),

    /// Provider needs configuration that is absent
    #[error("{provider} provider requires {dependency}")]
    MissingDependency {
        /// Provider being constructed
        provider: String,
        /// What is missing
        dependency: &'static str,
    },

    /// Provider entry is malformed
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Callback did not include an authorization code
    #[error("callback is missing the authorization code")]
    MissingCode,

    /// Callback state does not match the session
    #[error("callback state does not match session")]
    StateMismatch,

    /// User or provider refused the authorization
    #[error("authorization denied: {0}")]
    AccessDenied(String),

    /// Session has not completed the code exchange
    #[error("session is not authorized")]
    NotAuthorized,

    /// Token endpoint call failed
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// User info endpoint call failed
    #[error("user info request failed: {0}")]
    UserInfo(String),

    /// OpenID discovery document could not be used
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Session could not be encoded or decoded
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
