//! Exchange orchestration tests against mock provider capabilities.

use super::MockProvider;
use crate::*;
use portcullis_providers::{
    CallbackData, OAuthProvider, ProviderError, ProviderName, ProviderRegistry, ProviderSession,
    ProvidersConfig,
};
use portcullis_storage::{MemoryStorage, Storage};
use portcullis_tokens::{attach_session, get_auth_token, grant_auth_token, TokenError};
use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

const TTL: u64 = 600;

async fn create_test_exchange(
    provider: Arc<MockProvider>,
) -> (Arc<MemoryStorage>, OAuthExchange<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let registry = Arc::new(ProviderRegistry::new());
    registry
        .load_providers(&ProvidersConfig::new().with_internal("Portcullis"))
        .await
        .unwrap();
    registry
        .use_providers([provider as Arc<dyn OAuthProvider>])
        .await;
    let exchange = OAuthExchange::new(Arc::clone(&storage), registry);
    (storage, exchange)
}

fn google() -> ProviderName {
    ProviderName::new("google")
}

#[tokio::test]
async fn test_full_exchange_then_reuse() {
    let (storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;

    let auth_url = exchange.grant_auth_url(&google(), TTL).await.unwrap();
    assert!(auth_url.token.len() >= 32);
    assert!(auth_url.url.contains(&format!("state={}", auth_url.token)));

    let mut tx = storage.begin_transaction().await.unwrap();
    let token = get_auth_token(tx.as_mut(), &auth_url.token).await.unwrap();
    assert_eq!(token.provider, "google");
    assert!(token.session().is_some());
    tx.rollback();

    let user = exchange
        .authorize_user(&auth_url.token, &CallbackData::new())
        .await
        .unwrap();
    assert_eq!(user.email.as_deref(), Some("someone@example.com"));
    assert_eq!(user.provider, google());

    let again = exchange
        .authorize_user(&auth_url.token, &CallbackData::new())
        .await;
    assert!(matches!(
        again,
        Err(ExchangeError::Token(TokenError::TokenAlreadyUsed))
    ));
    assert!(again.unwrap_err().is_token_rejected());
}

#[tokio::test]
async fn test_grant_for_unusable_providers() {
    let (_storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;

    for name in [ProviderName::unknown(), ProviderName::new("myspace")] {
        assert!(matches!(
            exchange.grant_auth_url(&name, TTL).await,
            Err(ExchangeError::Provider(ProviderError::InvalidProvider(_)))
        ));
    }
    assert!(matches!(
        exchange.grant_auth_url(&ProviderName::new("github"), TTL).await,
        Err(ExchangeError::Provider(ProviderError::ProviderNotConfigured(_)))
    ));
}

#[tokio::test]
async fn test_failed_begin_auth_leaves_no_token() {
    let provider = Arc::new(MockProvider {
        fail_begin: true,
        ..MockProvider::new("google")
    });
    let (storage, exchange) = create_test_exchange(Arc::clone(&provider)).await;

    let result = exchange.grant_auth_url(&google(), TTL).await;
    assert!(matches!(result, Err(ExchangeError::Provider(_))));

    let state = provider.last_state().unwrap();
    let mut tx = storage.begin_transaction().await.unwrap();
    assert!(matches!(
        get_auth_token(tx.as_mut(), &state).await,
        Err(TokenError::TokenNotFound)
    ));
}

#[tokio::test]
async fn test_provider_failure_is_retry_safe() {
    let provider = Arc::new(MockProvider::new("google"));
    provider.failing_authorizations.store(1, Ordering::SeqCst);
    let (_storage, exchange) = create_test_exchange(Arc::clone(&provider)).await;

    let auth_url = exchange.grant_auth_url(&google(), TTL).await.unwrap();

    let first = exchange
        .authorize_user(&auth_url.token, &CallbackData::new())
        .await;
    assert!(matches!(
        first,
        Err(ExchangeError::Provider(ProviderError::Exchange(_)))
    ));

    let retry = exchange
        .authorize_user(&auth_url.token, &CallbackData::new())
        .await
        .unwrap();
    assert_eq!(retry.user_id, "108");
}

#[tokio::test]
async fn test_unknown_and_empty_state() {
    let (_storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;

    for state in ["", "not-a-token"] {
        assert!(matches!(
            exchange.authorize_user(state, &CallbackData::new()).await,
            Err(ExchangeError::Token(TokenError::TokenNotFound))
        ));
    }
}

#[tokio::test]
async fn test_token_without_session() {
    let (storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;

    let mut tx = storage.begin_transaction().await.unwrap();
    let token = grant_auth_token(tx.as_mut(), "google", TTL).await.unwrap();
    tx.commit().await.unwrap();

    assert!(matches!(
        exchange.authorize_user(&token.token, &CallbackData::new()).await,
        Err(ExchangeError::InvalidSession(_))
    ));
}

#[tokio::test]
async fn test_token_for_unregistered_provider_is_not_consumed() {
    let (storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;

    let mut tx = storage.begin_transaction().await.unwrap();
    let mut token = grant_auth_token(tx.as_mut(), "github", TTL).await.unwrap();
    let session = ProviderSession::new("https://github.com/login/oauth/authorize", &token.token);
    attach_session(tx.as_mut(), &mut token, session.marshal().unwrap()).unwrap();
    tx.commit().await.unwrap();

    assert!(matches!(
        exchange.authorize_user(&token.token, &CallbackData::new()).await,
        Err(ExchangeError::Provider(ProviderError::ProviderNotConfigured(_)))
    ));

    let mut tx = storage.begin_transaction().await.unwrap();
    let stored = get_auth_token(tx.as_mut(), &token.token).await.unwrap();
    assert!(!stored.used);
    assert_eq!(stored.provider, "github");
}

#[tokio::test]
async fn test_cancelled_authorization_rolls_back() {
    let provider = Arc::new(MockProvider::new("google"));
    let (_storage, exchange) = create_test_exchange(Arc::clone(&provider)).await;
    let auth_url = exchange.grant_auth_url(&google(), TTL).await.unwrap();

    provider.authorize_delay_ms.store(5_000, Ordering::SeqCst);
    let data = CallbackData::new();
    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        exchange.authorize_user(&auth_url.token, &data),
    )
    .await;
    assert!(timed_out.is_err());

    // the dropped call released its row lock and consumed nothing
    provider.authorize_delay_ms.store(0, Ordering::SeqCst);
    assert!(exchange
        .authorize_user(&auth_url.token, &data)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_concurrent_callbacks_exactly_one_wins() {
    let (_storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;
    let exchange = Arc::new(exchange);
    let auth_url = exchange.grant_auth_url(&google(), TTL).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let exchange = Arc::clone(&exchange);
        let state = auth_url.token.clone();
        handles.push(tokio::spawn(async move {
            exchange.authorize_user(&state, &CallbackData::new()).await
        }));
    }

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(ExchangeError::Token(TokenError::TokenAlreadyUsed)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(won, 1);
}

#[tokio::test]
async fn test_is_enabled_pass_through() {
    let (_storage, exchange) = create_test_exchange(Arc::new(MockProvider::new("google"))).await;

    assert!(exchange.is_enabled(&ProviderName::new("portcullis")).await.is_ok());
    assert!(exchange.is_enabled(&google()).await.is_ok());
    assert!(exchange.is_enabled(&ProviderName::new("github")).await.is_err());
    assert!(exchange.is_enabled(&ProviderName::unknown()).await.is_err());
}
