//! Reversible field encryption for user name and email.
//!
//! Values are sealed with AES-256-GCM under the server key and stored as
//! `base64(nonce || ciphertext || tag)`. Every call draws a fresh nonce, so the
//! same plaintext never encrypts to the same string twice.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64ct::{Base64, Encoding};

use crate::error::AuthError;

pub const KEY_LENGTH: usize = 32;
pub const NONCE_LENGTH: usize = 12;
pub const TAG_LENGTH: usize = 16;

#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    pub fn new(key: &[u8]) -> Result<Self, AuthError> {
        if key.len() != KEY_LENGTH {
            return Err(AuthError::Crypto(format!(
                "invalid key length: expected {}, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| AuthError::Crypto(format!("failed to create cipher: {e}")))?;
        Ok(Self { cipher })
    }

    /// Builds the cipher from the base64 form used in `ENCRYPTION_KEY`.
    pub fn from_base64_key(encoded: &str) -> Result<Self, AuthError> {
        let key = Base64::decode_vec(encoded.trim())
            .map_err(|e| AuthError::Crypto(format!("key is not valid base64: {e}")))?;
        Self::new(&key)
    }

    pub fn encrypt_value(&self, plaintext: &str) -> Result<String, AuthError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LENGTH + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(Base64::encode_string(&out))
    }

    pub fn decrypt_value(&self, ciphertext: &str) -> Result<String, AuthError> {
        let raw = Base64::decode_vec(ciphertext)
            .map_err(|e| AuthError::Crypto(format!("ciphertext is not valid base64: {e}")))?;
        if raw.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(AuthError::Crypto("ciphertext too short".into()));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LENGTH);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| AuthError::Crypto("decryption failed: wrong key or tampered data".into()))?;

        String::from_utf8(plain)
            .map_err(|e| AuthError::Crypto(format!("plaintext is not utf-8: {e}")))
    }
}
