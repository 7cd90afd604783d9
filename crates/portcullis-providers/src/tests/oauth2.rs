//! Generic OAuth2 capability tests. None of these reach the network.

use super::entry;
use crate::oauth2::map_profile;
use crate::*;
use serde_json::json;
use url::Url;

fn github() -> OAuth2Provider {
    let mut github = entry("client-123");
    github.scopes = vec!["read:user".to_string(), "user:email".to_string()];
    OAuth2Provider::new(
        ExternalProvider::GitHub.into(),
        &github,
        ExternalProvider::GitHub.spec("").unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_begin_auth_builds_redirect() {
    let provider = github();
    let session = provider.begin_auth("state-token").await.unwrap();

    let url = Url::parse(&session.auth_url).unwrap();
    assert_eq!(url.host_str(), Some("github.com"));
    let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(query["client_id"], "client-123");
    assert_eq!(query["redirect_uri"], "http://x/callback");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["state"], "state-token");
    // forced scope is not duplicated
    assert_eq!(query["scope"], "read:user user:email");
    assert_eq!(session.state, "state-token");
}

#[tokio::test]
async fn test_extra_scopes_appended() {
    let provider = OAuth2Provider::new(
        ExternalProvider::Discord.into(),
        &entry("abc"),
        ExternalProvider::Discord.spec("").unwrap(),
    )
    .unwrap();
    let session = provider.begin_auth("s").await.unwrap();
    assert!(session.auth_url.contains("scope=identify+email"));
}

#[tokio::test]
async fn test_authorize_requires_code() {
    let provider = github();
    let mut session = provider.begin_auth("s").await.unwrap();

    let result = provider.authorize(&mut session, &CallbackData::new()).await;
    assert!(matches!(result, Err(ProviderError::MissingCode)));
}

#[tokio::test]
async fn test_authorize_rejects_state_mismatch() {
    let provider = github();
    let mut session = provider.begin_auth("expected").await.unwrap();

    let params: CallbackData = [("code", "c"), ("state", "forged")].into_iter().collect();
    let result = provider.authorize(&mut session, &params).await;
    assert!(matches!(result, Err(ProviderError::StateMismatch)));
}

#[tokio::test]
async fn test_authorize_reports_denial() {
    let provider = github();
    let mut session = provider.begin_auth("s").await.unwrap();

    let params: CallbackData = [("error", "access_denied"), ("error_description", "user said no")]
        .into_iter()
        .collect();
    match provider.authorize(&mut session, &params).await {
        Err(ProviderError::AccessDenied(reason)) => assert_eq!(reason, "user said no"),
        other => panic!("expected AccessDenied, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_user_requires_authorized_session() {
    let provider = github();
    let session = provider.begin_auth("s").await.unwrap();

    let result = provider.fetch_user(&session).await;
    assert!(matches!(result, Err(ProviderError::NotAuthorized)));
}

#[test]
fn test_invalid_callback_url_rejected() {
    let result = OAuth2Provider::new(
        ExternalProvider::Google.into(),
        &ProviderEntry::new("abc", "shh", "not a url"),
        ExternalProvider::Google.spec("").unwrap(),
    );
    assert!(matches!(result, Err(ProviderError::InvalidConfig(_))));
}

#[test]
fn test_map_profile_numeric_id() {
    let json = json!({
        "id": 583231,
        "login": "octocat",
        "email": "octocat@github.com",
        "avatar_url": "https://avatars.example/octocat"
    });
    let user = map_profile(&"github".into(), &json, None).unwrap();
    assert_eq!(user.user_id, "583231");
    assert_eq!(user.name.as_deref(), Some("octocat"));
    assert_eq!(user.email.as_deref(), Some("octocat@github.com"));
    assert_eq!(user.avatar_url.as_deref(), Some("https://avatars.example/octocat"));
}

#[test]
fn test_map_profile_nested() {
    let json = json!({
        "data": [{ "id": "44322889", "display_name": "dallas", "email": "d@example.com" }]
    });
    let spec = ExternalProvider::Twitch.spec("").unwrap();
    let user = map_profile(&"twitch".into(), &json, spec.profile_pointer).unwrap();
    assert_eq!(user.user_id, "44322889");
    assert_eq!(user.name.as_deref(), Some("dallas"));
    assert!(spec.client_id_header);
}

#[test]
fn test_map_profile_without_id_fails() {
    let json = json!({ "email": "nobody@example.com" });
    let result = map_profile(&"google".into(), &json, None);
    assert!(matches!(result, Err(ProviderError::UserInfo(_))));
}

#[test]
fn test_session_survives_marshalling() {
    let mut session = ProviderSession::new("https://example.com/authorize", "s");
    session.extra.insert("code_verifier".to_string(), "v".to_string());

    let restored = ProviderSession::unmarshal(&session.marshal().unwrap()).unwrap();
    assert_eq!(restored, session);
    assert!(ProviderSession::unmarshal("{not json").is_err());
}

#[test]
fn test_every_external_provider_round_trips_its_name() {
    for &provider in ExternalProvider::ALL {
        assert_eq!(ExternalProvider::from_name(provider.as_str()), Some(provider));
        assert_eq!(ProviderName::from(provider).external(), Some(provider));
    }
}
