//! Bearer credential generation and hashing for administrative accounts.
//!
//! Each administrative identity stores only the SHA-256 hash of its API
//! token; the raw token is returned exactly once at account creation.

use muster_core::{AppError, AppResult};

/// Generates a cryptographically random API token and its SHA-256 hash.
///
/// Returns `(raw_token_hex, sha256_hash_hex)`.
pub fn generate_api_token() -> AppResult<(String, String)> {
    use std::fmt::Write;

    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate api token: {error}")))?;

    let raw_token = bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });

    let hash = hash_api_token(&raw_token);
    Ok((raw_token, hash))
}

/// Computes the SHA-256 hash of an API token string for storage.
#[must_use]
pub fn hash_api_token(raw_token: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
