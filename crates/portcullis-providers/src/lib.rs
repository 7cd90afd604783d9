//! # portcullis-providers
//!
//! OAuth provider capabilities and the registry that holds them.
//!
//! Providers are identified by a normalized [`ProviderName`]. Only names in
//! the closed [`ExternalProvider`] set are eligible for OAuth dispatch. Those
//! with a built-in endpoint table can be loaded from configuration as a
//! generic [`OAuth2Provider`]; the rest, along with test doubles and custom
//! backends, implement [`OAuthProvider`] and are registered with
//! [`ProviderRegistry::use_providers`].

#![warn(clippy::all)]

pub mod config;
pub mod errors;
pub mod external;
pub mod name;
pub mod oauth2;
pub mod registry;
pub mod traits;


pub use config::{ProviderEntry, ProvidersConfig};
pub use errors::{ProviderError, Result};
pub use external::{Dependency, ExternalProvider, ProviderSpec};
pub use name::ProviderName;
pub use oauth2::OAuth2Provider;
pub use registry::ProviderRegistry;
pub use traits::{CallbackData, ExternalUser, OAuthProvider, ProviderSession};
