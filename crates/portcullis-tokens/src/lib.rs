//! # portcullis-tokens
//!
//! Token records kept by the service.
//!
//! - [`auth`]: single-use state tokens binding an in-flight OAuth exchange
//!   to a provider and its serialized session.
//! - [`bearer`]: access/refresh credential pairs. Access tokens are signed
//!   JWTs and never stored; refresh tokens are opaque, stored by hash, and
//!   rotated on every use.
//!
//! Every mutation runs inside a storage transaction. Redemption relies on
//! the transaction's row locks, so the services themselves hold no locks.

#![warn(clippy::all)]

pub mod auth;
pub mod bearer;
pub mod errors;
mod random;
pub mod user;

#[cfg(test)]
mod tests;

pub use auth::{attach_session, get_auth_token, grant_auth_token, use_token, AuthToken};
pub use bearer::{
    BearerToken, CredentialIssuer, RefreshTokenRecord, ReusePolicy, RevocationReason,
    DEFAULT_REFRESH_TOKEN_TTL,
};
pub use errors::{Result, TokenError};
pub use random::{base64_url_encode, generate_random_bytes, secure_token, sha256, token_hash_for_log};
pub use user::{Role, UserSnapshot, UserStatus};
