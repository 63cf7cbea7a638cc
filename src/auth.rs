//! Kraken API Authentication Module
//!
//! Signs private REST requests (API-Sign header) and hands out nonces.
//!
//! Authentication algorithm:
//! 1. Create SHA256 hash of (nonce + POST data)
//! 2. Decode API secret from base64
//! 3. Create HMAC-SHA512 of (URI path + SHA256 hash) using decoded secret
//! 4. Base64 encode the HMAC result for API-Sign header

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// Authentication errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid API secret: {0}")]
    InvalidCredentials(String),
}

/// Decode the Base64 API secret into raw HMAC key bytes
pub fn decode_secret(secret_base64: &str) -> Result<Vec<u8>, AuthError> {
    let key = BASE64
        .decode(secret_base64)
        .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
    if key.is_empty() {
        return Err(AuthError::InvalidCredentials("secret is empty".to_string()));
    }
    Ok(key)
}

/// Generate the API-Sign value for a private endpoint.
///
/// Pure: the same (path, body, nonce, secret) always yields the same string.
pub fn sign(
    uri_path: &str,
    post_data: &str,
    nonce: &str,
    secret_base64: &str,
) -> Result<String, AuthError> {
    let secret = decode_secret(secret_base64)?;

    // Step 1: SHA256(nonce + POST_data)
    let mut sha256 = Sha256::new();
    sha256.update(nonce.as_bytes());
    sha256.update(post_data.as_bytes());
    let sha256_hash = sha256.finalize();

    // Step 2: HMAC-SHA512(uri_path + sha256_hash, api_secret)
    let mut hmac = HmacSha512::new_from_slice(&secret)
        .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
    hmac.update(uri_path.as_bytes());
    hmac.update(&sha256_hash);
    let hmac_result = hmac.finalize().into_bytes();

    // Step 3: Base64 encode
    Ok(BASE64.encode(hmac_result))
}

/// Redact an API key for display/logging
pub fn redact_key(api_key: &str) -> String {
    if api_key.len() > 8 && api_key.is_ascii() {
        format!("{}...{}", &api_key[..4], &api_key[api_key.len() - 4..])
    } else {
        "****".to_string()
    }
}

/// Source of request nonces.
///
/// Call once per signed request. Kraken rejects a nonce that is not larger
/// than the last one it saw for the key.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Unix time in milliseconds at the moment of the call.
///
/// Increasing only because runs are minutes apart; two calls inside the
/// same millisecond return the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClockNonce;

impl NonceSource for WallClockNonce {
    fn next_nonce(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Deterministic nonces: start, start + 1, start + 2, ...
#[derive(Debug)]
pub struct SequenceNonce {
    next: AtomicU64,
}

impl SequenceNonce {
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl NonceSource for SequenceNonce {
    fn next_nonce(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
