//! # portcullis-jwt
//!
//! Stateless signing and verification of compact JWS tokens built from
//! typed claim variants.
//!
//! - [`Token`] stamps issuer, issued-at, audience, expiration, and scope
//!   from a [`JwtConfig`] onto a [`Claims`] variant and signs it.
//! - [`parse_claims`] and [`parse_data`] verify a compact token against the
//!   configured key, issuer, and audience.
//!
//! A shared secret selects HMAC. Otherwise a PEM private key is loaded and
//! the algorithm family must match it.

#![warn(clippy::all)]

pub mod claims;
pub mod config;
pub mod errors;
mod keys;
mod parse;
mod token;


pub use claims::{Claims, StandardClaims, UserClaims, WebhookClaims, SUPER_ADMIN_ID};
pub use config::JwtConfig;
pub use errors::{JwtError, Result};
pub use parse::{parse_claims, parse_data, parse_user_claims, parse_webhook_claims};
pub use token::{current_timestamp, new_signed_data, Token};
