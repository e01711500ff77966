//! Encryption of vault payloads at rest.
//!
//! Layout of a sealed value: `base64(salt[16] || nonce[12] || ciphertext)`.
//! The AES-256-GCM key is derived from the vault secret and the per-value
//! salt with Argon2id.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::utils::ApiError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct VaultCipher {
    secret: String,
}

impl std::fmt::Debug for VaultCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultCipher").finish_non_exhaustive()
    }
}

impl VaultCipher {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    fn derive_key(&self, salt: &[u8]) -> Result<[u8; KEY_LEN], ApiError> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(self.secret.as_bytes(), salt, &mut key)
            .map_err(|e| ApiError::vault_crypto(format!("key derivation failed: {}", e)))?;
        Ok(key)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, ApiError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = self.derive_key(&salt)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| ApiError::vault_crypto(format!("encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&salt);
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = STANDARD
            .decode(sealed.trim())
            .map_err(|e| ApiError::vault_crypto(format!("invalid encoding: {}", e)))?;

        if bytes.len() <= SALT_LEN + NONCE_LEN {
            return Err(ApiError::vault_crypto("sealed value is truncated"));
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let key = self.derive_key(salt)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ApiError::vault_crypto("decryption failed"))
    }

    pub fn encrypt_json<T: serde::Serialize>(&self, value: &T) -> Result<String, ApiError> {
        let plaintext = serde_json::to_vec(value)?;
        self.encrypt(&plaintext)
    }

    pub fn decrypt_json<T: serde::de::DeserializeOwned>(&self, sealed: &str) -> Result<T, ApiError> {
        let plaintext = self.decrypt(sealed)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| ApiError::vault_crypto(format!("corrupt payload: {}", e)))
    }
}
