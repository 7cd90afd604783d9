//! Provider names.

use crate::external::ExternalProvider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized provider identifier.
///
/// Lowercase ASCII letters, digits and `-`; everything else is dropped. The
/// empty name is the unknown sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProviderName(String);

impl ProviderName {
    pub fn new(name: &str) -> Self {
        Self(
            name.chars()
                .map(|c| c.to_ascii_lowercase())
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
                .collect(),
        )
    }

    pub fn unknown() -> Self {
        Self(String::new())
    }

    /// Name of the built-in email/password provider for a service.
    ///
    /// Normalized like any other name, so `new(service_name)` matches it.
    pub fn internal(service_name: &str) -> Self {
        Self::new(service_name)
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    /// Allow-list entry for this name, if any
    pub fn external(&self) -> Option<ExternalProvider> {
        ExternalProvider::from_name(&self.0)
    }

    pub fn is_external(&self) -> bool {
        self.external().is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ProviderName {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<ProviderName> for String {
    fn from(name: ProviderName) -> Self {
        name.0
    }
}

impl From<ExternalProvider> for ProviderName {
    fn from(provider: ExternalProvider) -> Self {
        Self(provider.as_str().to_string())
    }
}
