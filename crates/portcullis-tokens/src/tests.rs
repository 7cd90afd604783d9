
use crate::*;
use portcullis_jwt::JwtConfig;
use portcullis_storage::MemoryStorage;
use std::sync::Arc;
use uuid::Uuid;

fn jwt_config() -> JwtConfig {
    let mut config = JwtConfig {
        secret: "token-test-secret".to_string(),
        audience: "portcullis-api".to_string(),
        expiration: 900,
        ..Default::default()
    };
    config.normalize("Portcullis");
    config
}

fn create_test_issuer() -> (Arc<MemoryStorage>, CredentialIssuer<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let issuer = CredentialIssuer::new(Arc::clone(&storage), jwt_config());
    (storage, issuer)
}

fn active_user() -> UserSnapshot {
    UserSnapshot::new(Uuid::new_v4(), "github")
        .with_status(UserStatus::Active)
        .confirmed()
}

#[test]
fn test_secure_token_shape() {
    let token = secure_token();
    assert_eq!(token.len(), 43);
    assert!(!token.contains('='));
    assert_ne!(token, secure_token());
}

#[test]
fn test_token_hash_for_log_is_short_and_stable() {
    let hashed = token_hash_for_log("abc");
    assert_eq!(hashed.len(), 12);
    assert_eq!(hashed, token_hash_for_log("abc"));
    assert!(!hashed.contains("abc"));
}

#[test]
fn test_user_status_flags() {
    let id = Uuid::new_v4();

    let unconfirmed = UserSnapshot::new(id, "").with_status(UserStatus::Active);
    assert!(!unconfirmed.is_active());
    assert!(unconfirmed.is_restricted());

    let active = unconfirmed.clone().confirmed();
    assert!(active.is_active());
    assert!(!active.is_restricted());
    assert!(!active.is_verified());

    let verified = active.clone().with_status(UserStatus::Verified);
    assert!(verified.is_verified());

    let locked = active.clone().with_status(UserStatus::Locked);
    assert!(!locked.is_active());
    assert!(!locked.is_restricted());
    assert!(!locked.is_confirmed());

    let banned = active.with_status(UserStatus::Banned);
    assert!(banned.is_banned());
    assert!(banned.is_locked());
}

#[test]
fn test_snapshot_claims() {
    let user = active_user().with_role(Role::Admin);
    let claims = user.claims().unwrap();
    assert_eq!(claims.user_id(), user.id);
    assert_eq!(claims.provider(), "github");
    assert!(claims.admin());
    assert!(claims.confirmed());
    assert!(!claims.restricted());
    assert!(!claims.verified());

    let reserved = UserSnapshot::new(portcullis_jwt::SUPER_ADMIN_ID, "");
    assert!(reserved.claims().is_err());
}
