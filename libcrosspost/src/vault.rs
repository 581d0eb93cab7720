//! Vault secret decryption
//!
//! Workspace credentials are stored encrypted (AES-256-GCM) with the
//! ciphertext, initialization vector, and authentication tag kept as
//! separate base64 columns. The key is operator-held and arrives via
//! configuration; rotation happens outside this process.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::db::VaultSecretRow;
use crate::error::VaultError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AEAD cipher over vault rows.
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(key_b64: &str) -> Result<Self, VaultError> {
        let key = BASE64
            .decode(key_b64.trim())
            .map_err(|e| VaultError::InvalidKey(format!("not valid base64: {}", e)))?;

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| VaultError::InvalidKey(format!("expected 32 bytes, got {}", key.len())))?;

        Ok(Self { cipher })
    }

    /// Decrypt one vault row back to its plaintext credential value.
    pub fn decrypt(&self, row: &VaultSecretRow) -> Result<String, VaultError> {
        let ciphertext = BASE64
            .decode(&row.encrypted_value)
            .map_err(|e| VaultError::Malformed(format!("value for '{}': {}", row.slug, e)))?;
        let iv = BASE64
            .decode(&row.iv)
            .map_err(|e| VaultError::Malformed(format!("iv for '{}': {}", row.slug, e)))?;
        let tag = BASE64
            .decode(&row.auth_tag)
            .map_err(|e| VaultError::Malformed(format!("tag for '{}': {}", row.slug, e)))?;

        if iv.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(VaultError::Malformed(format!(
                "bad iv/tag length for '{}'",
                row.slug
            )));
        }

        // aes-gcm expects the tag appended to the ciphertext
        let mut combined = ciphertext;
        combined.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), combined.as_ref())
            .map_err(|_| VaultError::DecryptFailed(row.slug.clone()))?;

        String::from_utf8(plaintext)
            .map_err(|e| VaultError::Malformed(format!("utf-8 for '{}': {}", row.slug, e)))
    }

    /// Encrypt a credential value into the (value, iv, tag) triple the vault
    /// table stores. Used by operator tooling and test fixtures.
    pub fn encrypt(&self, plaintext: &str) -> Result<(String, String, String), VaultError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Malformed(format!("encryption failed: {}", e)))?;

        let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

        Ok((
            BASE64.encode(&ciphertext),
            BASE64.encode(nonce_bytes),
            BASE64.encode(&tag),
        ))
    }
}

/// Generate a fresh base64 vault key. Operator convenience.
pub fn generate_key_b64() -> String {
    let key: [u8; 32] = rand::random();
    BASE64.encode(key)
}
