//! Payload encryption using AES-256-GCM
//!
//! Every envelope gets its own freshly generated [`Secret`]. The payload is
//! encrypted exactly once under that secret, and the secret is then wrapped
//! separately for each recipient (see [`SecretShare`](super::SecretShare)).

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as GcmNonce,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-256-GCM key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// The tag did not verify: tampered ciphertext, wrong key or wrong nonce
    #[error("authentication failure")]
    AuthenticationFailure,
    #[error("invalid secret size, expected {expected}, got {got}")]
    InvalidSize { expected: usize, got: usize },
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A 96-bit AES-GCM nonce
///
/// Nonces are not secret and travel in the clear next to the ciphertext, but a
/// (key, nonce) pair must never be used twice. [`Secret::encrypt`] draws a new
/// one on every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_SIZE]);

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Nonce(bytes)
    }
}

impl Nonce {
    /// Generate a random nonce using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a nonce from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `NONCE_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != NONCE_SIZE {
            return Err(SecretError::InvalidSize {
                expected: NONCE_SIZE,
                got: data.len(),
            });
        }
        let mut buff = [0u8; NONCE_SIZE];
        buff.copy_from_slice(data);
        Ok(Self(buff))
    }

    pub fn bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// A 256-bit symmetric key
///
/// The key bytes are wiped when the value is dropped, including when it goes out of
/// scope on an error path. `Debug` never prints them.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate();
///
/// let (nonce, ciphertext) = secret.encrypt(b"sensitive data")?;
/// let recovered = secret.decrypt(&ciphertext, &nonce)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut secret = Self([0; SECRET_SIZE]);
        getrandom::getrandom(&mut secret.0).expect("failed to generate random bytes");
        secret
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::InvalidSize {
                expected: SECRET_SIZE,
                got: data.len(),
            });
        }
        let mut secret = Self([0; SECRET_SIZE]);
        secret.0.copy_from_slice(data);
        Ok(secret)
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()))
    }

    /// Encrypt data using AES-256-GCM without associated data
    ///
    /// A random nonce is generated for each call and returned alongside the
    /// ciphertext, which carries the 16-byte tag at its end.
    ///
    /// # Errors
    ///
    /// Returns an error only if the payload exceeds what AES-GCM can encrypt
    /// under a single nonce.
    pub fn encrypt(&self, data: &[u8]) -> Result<(Nonce, Vec<u8>), SecretError> {
        let nonce = Nonce::generate();
        let ciphertext = self
            .cipher()
            .encrypt(GcmNonce::from_slice(nonce.bytes()), data)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;
        Ok((nonce, ciphertext))
    }

    /// Decrypt data using AES-256-GCM
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::AuthenticationFailure`] if the tag does not verify. This
    /// covers tampered data, the wrong key and the wrong nonce alike.
    pub fn decrypt(&self, data: &[u8], nonce: &Nonce) -> Result<Vec<u8>, SecretError> {
        if data.len() < TAG_SIZE {
            return Err(SecretError::AuthenticationFailure);
        }
        self.cipher()
            .decrypt(GcmNonce::from_slice(nonce.bytes()), data)
            .map_err(|_| SecretError::AuthenticationFailure)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::generate();
        let data = b"hello world, this is a test message for encryption";

        let (nonce, encrypted) = secret.encrypt(data).unwrap();
        assert_eq!(encrypted.len(), data.len() + TAG_SIZE);
        let decrypted = secret.decrypt(&encrypted, &nonce).unwrap();

        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_empty_data_encryption() {
        let secret = Secret::generate();

        let (nonce, encrypted) = secret.encrypt(b"").unwrap();
        assert_eq!(encrypted.len(), TAG_SIZE);
        let decrypted = secret.decrypt(&encrypted, &nonce).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let secret = Secret::generate();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let (nonce, _) = secret.encrypt(b"same plaintext").unwrap();
            assert!(seen.insert(nonce));
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let secret = Secret::generate();
        let (nonce, mut encrypted) = secret.encrypt(b"test data for integrity check").unwrap();

        encrypted[3] ^= 0x01;
        assert!(matches!(
            secret.decrypt(&encrypted, &nonce),
            Err(SecretError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_wrong_key_or_nonce_fails() {
        let secret = Secret::generate();
        let (nonce, encrypted) = secret.encrypt(b"payload").unwrap();

        let other = Secret::generate();
        assert!(matches!(
            other.decrypt(&encrypted, &nonce),
            Err(SecretError::AuthenticationFailure)
        ));

        let mut nonce_bytes = *nonce.bytes();
        nonce_bytes[0] ^= 0x80;
        assert!(matches!(
            secret.decrypt(&encrypted, &Nonce::from(nonce_bytes)),
            Err(SecretError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let secret = Secret::generate();
        assert!(matches!(
            secret.decrypt(&[0u8; TAG_SIZE - 1], &Nonce::generate()),
            Err(SecretError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(Secret::from_slice(&[1u8; 16]).is_err());
        assert!(Secret::from_slice(&[1u8; 64]).is_err());
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());

        assert!(Nonce::from_slice(&[0u8; NONCE_SIZE + 1]).is_err());
        assert!(Nonce::from_slice(&[0u8; NONCE_SIZE]).is_ok());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::from([0xab; SECRET_SIZE]);
        assert_eq!(format!("{:?}", secret), "Secret(..)");
    }
}
