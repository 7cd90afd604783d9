//! Column family definitions.

/// Auth tokens: token → AuthToken
pub const CF_AUTH_TOKENS: &str = "auth_tokens";

/// Refresh tokens: token_hash → RefreshTokenRecord
pub const CF_REFRESH_TOKENS: &str = "refresh_tokens";

/// Refresh tokens by user index: (user_id, token_hash) → ()
pub const CF_REFRESH_TOKENS_BY_USER: &str = "refresh_tokens_by_user";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![CF_AUTH_TOKENS, CF_REFRESH_TOKENS, CF_REFRESH_TOKENS_BY_USER]
}
