//! AES-256-GCM encryption for secrets stored in the database.
//!
//! TOTP shared secrets must be recoverable (unlike passwords), so they are
//! encrypted with a server key rather than hashed. The stored form is
//! `hex(nonce || ciphertext)`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::CoreError;
use crate::hashing::{hex_decode, hex_encode};

/// AES-GCM nonce length in bytes.
const NONCE_LENGTH: usize = 12;

/// Required key length in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// Encrypts and decrypts small secrets with a fixed server key.
#[derive(Clone)]
pub struct SecretBox {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretBox(..)")
    }
}

impl SecretBox {
    /// Build from a 64-character hex key.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, CoreError> {
        let bytes = hex_decode(hex_key.trim())
            .map_err(|e| CoreError::Validation(format!("Encryption key is not hex: {e}")))?;
        if bytes.len() != KEY_LENGTH {
            return Err(CoreError::Validation(format!(
                "Encryption key must be {KEY_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(&bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt `plaintext` with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CoreError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CoreError::Internal("Secret encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(hex_encode(out))
    }

    /// Decrypt a value produced by [`SecretBox::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, CoreError> {
        let bytes = hex_decode(encoded)
            .map_err(|e| CoreError::Internal(format!("Stored secret is not hex: {e}")))?;
        if bytes.len() <= NONCE_LENGTH {
            return Err(CoreError::Internal("Stored secret is truncated".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LENGTH);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Internal("Secret decryption failed".to_string()))
    }
}
