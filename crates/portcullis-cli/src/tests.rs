use crate::config::Config;
use portcullis_providers::ProviderName;
use std::collections::HashMap;

fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (format!("PORTCULLIS_{}", key), value.to_string()))
        .collect();
    Config::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn test_defaults() {
    let config = load(&[("JWT_SECRET", "secret")]).unwrap();

    assert_eq!(config.service_name, "portcullis");
    assert_eq!(config.jwt.issuer, "portcullis");
    assert_eq!(config.jwt.algorithm, "HS256");
    assert_eq!(config.jwt.expiration, 900);
    assert_eq!(config.refresh_token_expiry, 2_592_000);
    assert_eq!(config.auth_token_ttl, 600);
    assert_eq!(config.providers.internal, ProviderName::new("portcullis"));
    assert!(config.providers.entries.is_empty());
}

#[test]
fn test_jwt_key_required() {
    assert!(load(&[]).is_err());
    assert!(load(&[("JWT_PRIVATE_KEY", "/nonexistent/key.pem"), ("JWT_ALGORITHM", "RS256")]).is_err());
}

#[test]
fn test_invalid_numbers_rejected() {
    let result = load(&[("JWT_SECRET", "secret"), ("AUTH_TOKEN_TTL_SECONDS", "soon")]);
    assert!(result.is_err());
}

#[test]
fn test_internal_provider_toggle() {
    let config = load(&[
        ("JWT_SECRET", "secret"),
        ("SERVICE_NAME", "Acme Login"),
        ("PROVIDER_INTERNAL", "false"),
    ])
    .unwrap();
    assert!(config.providers.internal.is_unknown());
    assert_eq!(config.jwt.issuer, "acme login");

    let config = load(&[("JWT_SECRET", "secret"), ("SERVICE_NAME", "Acme Login")]).unwrap();
    assert_eq!(config.providers.internal.as_str(), "acmelogin");

    assert!(load(&[("JWT_SECRET", "secret"), ("PROVIDER_INTERNAL", "maybe")]).is_err());
}

#[test]
fn test_provider_entries() {
    let config = load(&[
        ("JWT_SECRET", "secret"),
        ("PROVIDERS", "google, openid-connect,github"),
        ("REDIRECT_HOST", "auth.example.com"),
        ("PROVIDER_GOOGLE_CLIENT_KEY", "abc"),
        ("PROVIDER_GOOGLE_SECRET", "shh"),
        ("PROVIDER_GOOGLE_CALLBACK_URL", "https://:host/callback"),
        ("PROVIDER_GOOGLE_SCOPES", "email,profile"),
        ("PROVIDER_OPENID_CONNECT_CLIENT_KEY", "oidc"),
        ("PROVIDER_OPENID_CONNECT_URL", "https://id.example.com/.well-known/openid-configuration"),
    ])
    .unwrap();

    let google = &config.providers.entries[&ProviderName::new("google")];
    assert_eq!(google.client_key, "abc");
    assert_eq!(google.secret, "shh");
    assert_eq!(google.callback_url, "https://auth.example.com/callback");
    assert_eq!(google.scopes, vec!["email".to_string(), "profile".to_string()]);
    assert_eq!(google.url, None);

    let oidc = &config.providers.entries[&ProviderName::new("openid-connect")];
    assert_eq!(oidc.client_key, "oidc");
    assert!(oidc.url.is_some());

    // listed but without a client key: present here, skipped at load time
    let github = &config.providers.entries[&ProviderName::new("github")];
    assert!(!github.is_enabled());
}
