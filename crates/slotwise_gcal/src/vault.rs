// --- File: crates/slotwise_gcal/src/vault.rs ---
//! Credential vault for OAuth refresh tokens at rest.
//!
//! Blobs are `base64(nonce || ciphertext || tag)` sealed with AES-256-GCM.
//! The key is derived from the operator secret with PBKDF2-HMAC-SHA256 and a
//! fixed application salt, and is derived again on every call so a rotated
//! secret takes effect immediately.

use base64::{engine::general_purpose, Engine as _};
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use slotwise_common::config_error;
use slotwise_config::env_vars::{self, VAULT_SECRET_PATH};
use std::num::NonZeroU32;

use crate::error::BookingError;

/// Application salt for key derivation. Changing it invalidates every stored blob.
const KEY_SALT: &[u8] = b"slotwise/credential-vault/v1";

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

const KEY_LEN: usize = 32;

fn derive_key(secret: &str) -> Result<LessSafeKey, BookingError> {
    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        PBKDF2_ITERATIONS,
        KEY_SALT,
        secret.as_bytes(),
        &mut key_bytes,
    );
    let unbound = UnboundKey::new(&aead::AES_256_GCM, &key_bytes)
        .map_err(|_| BookingError::Decryption("failed to build AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypts `plaintext` under a key derived from `secret`.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String, BookingError> {
    let key = derive_key(secret)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| BookingError::Store(config_error("system random source unavailable")))?;

    let mut in_out = plaintext.as_bytes().to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| BookingError::Store(config_error("failed to seal credential")))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);
    Ok(general_purpose::STANDARD.encode(blob))
}

/// Decrypts a blob produced by [`encrypt`].
///
/// Fails with `BookingError::Decryption` for malformed, truncated or tampered
/// blobs and for blobs sealed under a different secret.
pub fn decrypt(blob: &str, secret: &str) -> Result<String, BookingError> {
    let raw = general_purpose::STANDARD
        .decode(blob.trim())
        .map_err(|e| BookingError::Decryption(format!("blob is not valid base64: {}", e)))?;

    if raw.len() < NONCE_LEN + aead::AES_256_GCM.tag_len() {
        return Err(BookingError::Decryption(format!(
            "blob is truncated ({} bytes)",
            raw.len()
        )));
    }

    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| BookingError::Decryption("invalid nonce".to_string()))?;

    let key = derive_key(secret)?;
    let mut in_out = sealed.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            BookingError::Decryption("authentication failed (wrong key or corrupted data)".to_string())
        })?;

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| BookingError::Decryption("plaintext is not valid UTF-8".to_string()))
}

/// Where the vault gets its secret from.
#[derive(Debug, Clone)]
enum SecretSource {
    /// Looked up in the environment on every operation.
    Env(String),
    Fixed(String),
}

/// Encrypts and decrypts tenant refresh tokens with the process-wide secret.
#[derive(Debug, Clone)]
pub struct Vault {
    source: SecretSource,
}

impl Vault {
    /// Vault reading `SLOTWISE_SECRET_VAULT_SECRET` (legacy `VAULT_SECRET`) per call.
    pub fn from_env() -> Self {
        Self {
            source: SecretSource::Env(VAULT_SECRET_PATH.to_string()),
        }
    }

    /// Vault with a fixed secret, for tools and tests.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            source: SecretSource::Fixed(secret.into()),
        }
    }

    fn secret(&self) -> Result<String, BookingError> {
        match &self.source {
            SecretSource::Env(path) => {
                env_vars::read_secret(path).map_err(|e| BookingError::Store(config_error(e)))
            }
            SecretSource::Fixed(secret) => Ok(secret.clone()),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, BookingError> {
        encrypt(plaintext, &self.secret()?)
    }

    pub fn decrypt(&self, blob: &str) -> Result<String, BookingError> {
        decrypt(blob, &self.secret()?)
    }
}
