//! Session token generation and hashing.
//!
//! Tokens are opaque bearer credentials: 48 alphanumeric characters drawn
//! from the thread-local CSPRNG, which is roughly 285 bits of entropy, well
//! past the 256-bit floor. Only the SHA-256 digest is ever persisted; the
//! plaintext exists in memory for the duration of the issuing call and in
//! the caller's hands afterwards. Nothing about a token is derived from the
//! user id or any other predictable input.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the generated token string (alphanumeric characters).
pub const TOKEN_LENGTH: usize = 48;

/// Number of leading characters safe to include in log output.
pub const TOKEN_PREFIX_LENGTH: usize = 8;

/// The result of generating a new session token.
pub struct GeneratedToken {
    /// The plaintext token (returned to the caller exactly once, never stored).
    pub plaintext: String,
    /// The first [`TOKEN_PREFIX_LENGTH`] characters, for log correlation.
    pub prefix: String,
    /// The SHA-256 hex digest of the plaintext (stored in the database).
    pub hash: String,
}

/// Generate a new random session token.
pub fn generate_token() -> GeneratedToken {
    let token: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();

    let prefix = token[..TOKEN_PREFIX_LENGTH].to_string();
    let hash = hash_token(&token);

    GeneratedToken { plaintext: token, prefix, hash }
}

/// Compute the SHA-256 hex digest of a token.
///
/// Used at issuance (to store the hash) and at validation (to look the
/// session up by hash without the plaintext ever touching the database).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

/// Extract the log-safe prefix from a plaintext token.
pub fn token_prefix(token: &str) -> &str {
    &token[..TOKEN_PREFIX_LENGTH.min(token.len())]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
