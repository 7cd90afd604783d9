use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token not found")]
    TokenNotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token already used")]
    TokenAlreadyUsed,

    #[error("Refresh token revoked")]
    RefreshTokenRevoked,

    #[error("Invalid user: {0}")]
    InvalidUser(Uuid),

    #[error("Inactive user: {0}")]
    InactiveUser(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] portcullis_storage::StorageError),

    #[error("JWT error: {0}")]
    Jwt(#[from] portcullis_jwt::JwtError),
}

pub type Result<T> = std::result::Result<T, TokenError>;
