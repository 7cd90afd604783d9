//! Random token material and hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate random bytes of the specified length
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// URL-safe base64 encoding without padding
pub fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// 32 random bytes as a 43 character base64url string
pub fn secure_token() -> String {
    base64_url_encode(&generate_random_bytes::<32>())
}

/// Short stable identifier for a token value in log lines
pub fn token_hash_for_log(token: &str) -> String {
    hex::encode(&sha256(token.as_bytes())[..6])
}
