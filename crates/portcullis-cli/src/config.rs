use anyhow::{Context, Result};
use portcullis_jwt::JwtConfig;
use portcullis_providers::{ProviderEntry, ProviderName, ProvidersConfig};
use std::path::PathBuf;

const PREFIX: &str = "PORTCULLIS_";

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,

    /// RocksDB directory, used when built with the `rocksdb` feature
    #[cfg_attr(not(feature = "rocksdb"), allow(dead_code))]
    pub database_path: PathBuf,

    pub jwt: JwtConfig,

    /// Refresh token expiry (seconds)
    pub refresh_token_expiry: u64,

    /// Auth token lifetime (seconds); 0 never expires
    pub auth_token_ttl: u64,

    pub providers: ProvidersConfig,
}

impl Config {
    /// Load configuration from `PORTCULLIS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", PREFIX, name)).filter(|value| !value.trim().is_empty())
        };
        let number = |name: &str, default: u64| -> Result<u64> {
            match var(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .with_context(|| format!("{}{} must be a number", PREFIX, name)),
                None => Ok(default),
            }
        };

        let service_name = var("SERVICE_NAME").unwrap_or_else(|| "portcullis".to_string());

        let database_path = var("DATABASE_PATH")
            .unwrap_or_else(|| "./data/portcullis.db".to_string())
            .into();

        let mut jwt = JwtConfig {
            secret: var("JWT_SECRET").unwrap_or_default(),
            private_key_path: var("JWT_PRIVATE_KEY").map(PathBuf::from),
            public_key_path: var("JWT_PUBLIC_KEY").map(PathBuf::from),
            algorithm: var("JWT_ALGORITHM").unwrap_or_default(),
            issuer: var("JWT_ISSUER").unwrap_or_default(),
            audience: var("JWT_AUDIENCE").unwrap_or_default(),
            scope: var("JWT_SCOPE").unwrap_or_default(),
            expiration: number("JWT_EXPIRATION_SECONDS", 900)?, // 15 minutes
        };
        jwt.normalize(&service_name);
        jwt.check_required().context("invalid JWT configuration")?;

        let refresh_token_expiry = number("REFRESH_TOKEN_EXPIRY_SECONDS", 2_592_000)?; // 30 days
        let auth_token_ttl = number("AUTH_TOKEN_TTL_SECONDS", 600)?;

        let internal = match var("PROVIDER_INTERNAL") {
            Some(value) => parse_bool(&value)
                .with_context(|| format!("{}PROVIDER_INTERNAL must be a boolean", PREFIX))?,
            None => true,
        };
        let mut providers = ProvidersConfig::new();
        if internal {
            providers = providers.with_internal(&service_name);
        }

        let redirect_host = var("REDIRECT_HOST");
        for name in var("PROVIDERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            let key = env_key(name);
            let setting = |field: &str| var(&format!("PROVIDER_{}_{}", key, field));

            let mut callback_url = setting("CALLBACK_URL").unwrap_or_default();
            if let Some(host) = &redirect_host {
                callback_url = callback_url.replace(":host", host);
            }
            let mut entry = ProviderEntry::new(
                setting("CLIENT_KEY").unwrap_or_default(),
                setting("SECRET").unwrap_or_default(),
                callback_url,
            );
            entry.scopes = setting("SCOPES")
                .map(|scopes| split_list(&scopes))
                .unwrap_or_default();
            entry.url = setting("URL");

            providers = providers.with_entry(ProviderName::new(name), entry);
        }

        Ok(Config {
            service_name,
            database_path,
            jwt,
            refresh_token_expiry,
            auth_token_ttl,
            providers,
        })
    }
}

/// `openid-connect` becomes `OPENID_CONNECT`
fn env_key(name: &str) -> String {
    name.to_ascii_uppercase().replace('-', "_")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {}", other),
    }
}
