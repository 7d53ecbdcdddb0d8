// src/services/encryption.rs
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Encryption key not configured")]
    KeyNotConfigured,

    #[error("Invalid encryption key format")]
    InvalidKeyFormat,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid encrypted data format")]
    InvalidDataFormat,
}

/// AES-256-GCM encryption for sensitive settings at rest (API keys, DSNs).
/// Ciphertext format: base64(nonce || ciphertext).
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("cipher", &"<redacted>")
            .finish()
    }
}

impl EncryptionService {
    /// Initialize encryption service from the ENCRYPTION_MASTER_KEY env var
    pub fn from_env() -> Result<Self, EncryptionError> {
        let key_str =
            env::var("ENCRYPTION_MASTER_KEY").map_err(|_| EncryptionError::KeyNotConfigured)?;

        Self::from_key(&key_str)
    }

    /// Initialize encryption service from a base64-encoded 32-byte key
    pub fn from_key(key_str: &str) -> Result<Self, EncryptionError> {
        let key_bytes = BASE64
            .decode(key_str.as_bytes())
            .map_err(|_| EncryptionError::InvalidKeyFormat)?;

        if key_bytes.len() != 32 {
            return Err(EncryptionError::InvalidKeyFormat);
        }

        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Generate a fresh random master key, base64-encoded
    pub fn generate_key() -> String {
        let mut key_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key_bytes);
        BASE64.encode(key_bytes)
    }

    /// Encrypt a plaintext value for storage
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypt a stored value
    pub fn decrypt(&self, encoded: &str) -> Result<String, EncryptionError> {
        let combined = BASE64
            .decode(encoded.as_bytes())
            .map_err(|_| EncryptionError::InvalidDataFormat)?;

        if combined.len() < 12 {
            return Err(EncryptionError::InvalidDataFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|_| EncryptionError::InvalidDataFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> EncryptionService {
        let key = BASE64.encode([7u8; 32]);
        EncryptionService::from_key(&key).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let service = test_service();
        let encrypted = service.encrypt("sk-secret-value").unwrap();
        assert_ne!(encrypted, "sk-secret-value");
        assert_eq!(service.decrypt(&encrypted).unwrap(), "sk-secret-value");
    }

    #[test]
    fn test_unique_nonce_per_encryption() {
        let service = test_service();
        let a = service.encrypt("same input").unwrap();
        let b = service.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_short_key() {
        let key = BASE64.encode([1u8; 16]);
        assert!(matches!(
            EncryptionService::from_key(&key),
            Err(EncryptionError::InvalidKeyFormat)
        ));
    }

    #[test]
    fn test_rejects_garbage_ciphertext() {
        let service = test_service();
        assert!(service.decrypt("not base64 at all!").is_err());
        assert!(service.decrypt(&BASE64.encode(b"short")).is_err());
    }
}
