//! # portcullis-exchange
//!
//! Drives an OAuth authorization-code exchange across two requests.
//!
//! [`OAuthExchange::grant_auth_url`] mints a single-use auth token, starts
//! the provider flow with it as the `state`, and stores the provider session
//! on the token. [`OAuthExchange::authorize_user`] redeems that token from
//! the provider callback and returns the external profile.
//!
//! Each call is one storage transaction. Nothing is persisted unless the
//! whole step succeeds, and dropping a call mid-flight rolls it back.

#![warn(clippy::all)]

pub mod errors;
pub mod exchange;


pub use errors::{ExchangeError, Result};
pub use exchange::{AuthUrl, OAuthExchange};
