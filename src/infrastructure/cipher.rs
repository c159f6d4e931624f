//! Symmetric encryption for third-party credentials kept in user settings.
//!
//! Stored form is base64 of `nonce (12 bytes) || AES-256-GCM ciphertext`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("ENCRYPTION_KEY is not configured")]
    NotConfigured,
    #[error("ENCRYPTION_KEY must be exactly 32 bytes")]
    InvalidKey,
    #[error("Failed to encrypt credential")]
    Encrypt,
    #[error("Stored credential is not valid ciphertext")]
    Malformed,
    #[error("Failed to decrypt stored credential")]
    Decrypt,
}

pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// Without a key every operation fails with [`CipherError::NotConfigured`],
/// so the service still runs but refuses to store or use credentials.
pub struct AesGcmCipher {
    cipher: Option<Aes256Gcm>,
}

impl AesGcmCipher {
    pub fn new(key: Option<&str>) -> Result<Self, CipherError> {
        let cipher = match key {
            None => None,
            Some(key) if key.len() == KEY_LEN => Some(
                Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::InvalidKey)?,
            ),
            Some(_) => return Err(CipherError::InvalidKey),
        };
        Ok(Self { cipher })
    }

    fn cipher(&self) -> Result<&Aes256Gcm, CipherError> {
        self.cipher.as_ref().ok_or(CipherError::NotConfigured)
    }
}

impl CredentialCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&sealed);
        Ok(BASE64.encode(combined))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher()?;
        let combined = BASE64
            .decode(ciphertext.trim())
            .map_err(|_| CipherError::Malformed)?;
        if combined.len() <= NONCE_LEN {
            return Err(CipherError::Malformed);
        }

        let (nonce, sealed) = combined.split_at(NONCE_LEN);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CipherError::Malformed)
    }
}
