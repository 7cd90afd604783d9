use portcullis_providers::ProviderError;
use portcullis_storage::StorageError;
use portcullis_tokens::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ExchangeError {
    /// The auth token was missing, expired, or already redeemed
    pub fn is_token_rejected(&self) -> bool {
        matches!(
            self,
            ExchangeError::Token(
                TokenError::TokenNotFound | TokenError::TokenExpired | TokenError::TokenAlreadyUsed
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
