//! Per-recipient key wrapping (ECIES over secp256k1)
//!
//! This module wraps an envelope's [`Secret`] for one recipient so that only the
//! holder of the matching private key can recover it.
//!
//! # Protocol Overview
//!
//! To wrap a secret for a recipient:
//! 1. **Generate ephemeral keypair**: a one-time secp256k1 keypair, dropped right after use
//! 2. **Perform ECDH**: ephemeral private scalar × recipient public point
//! 3. **Derive KEK**: HKDF-SHA256 over the shared x-coordinate, salted with
//!    `ephemeral_public || recipient_public` (both uncompressed)
//! 4. **Wrap key**: AES-256-GCM encrypt the secret under the KEK with a random nonce
//! 5. **Package**: `ephemeral_public || wrap_nonce || wrapped_secret`
//!
//! The recipient recovers the secret by repeating the ECDH with their private key and
//! the embedded ephemeral public key, re-deriving the KEK, and decrypting.
//!
//! # Security Properties
//!
//! - **Independence**: every share uses its own ephemeral key, so shares for different
//!   recipients of the same secret cannot be correlated
//! - **No recipient oracle**: a wrong key and a tampered share fail identically
//! - **Integrity**: the GCM tag authenticates the wrapped secret

use std::fmt;

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::{Nonce, Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};

/// HKDF `info` string binding derived keys to this use
pub const KDF_INFO: &[u8] = b"multiseal/secret-share/v1";
/// Size of the wrapped secret including its tag
pub const WRAPPED_SECRET_SIZE: usize = SECRET_SIZE + TAG_SIZE;
/// Total size of a share in bytes
///
/// Layout: ephemeral_pubkey (65) || wrap_nonce (12) || wrapped_secret (48) = 125 bytes
pub const SECRET_SHARE_SIZE: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + WRAPPED_SECRET_SIZE;

const NONCE_OFFSET: usize = PUBLIC_KEY_SIZE;
const WRAPPED_OFFSET: usize = PUBLIC_KEY_SIZE + NONCE_SIZE;

/// Errors that can occur during share creation or recovery
#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    /// Wrong private key, or the share was altered
    #[error("authentication failure")]
    AuthenticationFailure,
    #[error("share error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(SecretError),
}

impl From<SecretError> for SecretShareError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::AuthenticationFailure => SecretShareError::AuthenticationFailure,
            other => SecretShareError::Secret(other),
        }
    }
}

/// A secret wrapped for one specific recipient
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 65 bytes ][ wrap_nonce: 12 bytes ][ wrapped_secret + tag: 48 bytes ]
/// ```
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate();
/// let bob = SecretKey::generate();
///
/// let share = SecretShare::new(&secret, &bob.public())?;
/// let recovered = share.recover(&bob)?;
/// assert_eq!(secret, recovered);
/// ```
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct SecretShare(pub(crate) [u8; SECRET_SHARE_SIZE]);

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretShare({})", self.to_hex())
    }
}

impl Serialize for SecretShare {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretShare {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};

        struct ShareVisitor;

        impl<'de> Visitor<'de> for ShareVisitor {
            type Value = SecretShare;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a byte array or sequence of {} bytes", SECRET_SHARE_SIZE)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                SecretShare::try_from(v).map_err(|_| {
                    E::invalid_length(
                        v.len(),
                        &format!("expected {} bytes", SECRET_SHARE_SIZE).as_str(),
                    )
                })
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(SECRET_SHARE_SIZE);
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                SecretShare::try_from(bytes.as_slice()).map_err(|_| {
                    A::Error::invalid_length(
                        bytes.len(),
                        &format!("expected {} bytes", SECRET_SHARE_SIZE).as_str(),
                    )
                })
            }
        }

        // bytes for bincode, seq for JSON
        deserializer.deserialize_byte_buf(ShareVisitor)
    }
}

impl From<[u8; SECRET_SHARE_SIZE]> for SecretShare {
    fn from(bytes: [u8; SECRET_SHARE_SIZE]) -> Self {
        SecretShare(bytes)
    }
}

impl From<SecretShare> for [u8; SECRET_SHARE_SIZE] {
    fn from(share: SecretShare) -> Self {
        share.0
    }
}

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != SECRET_SHARE_SIZE {
            return Err(anyhow::anyhow!(
                "invalid share size, expected {}, got {}",
                SECRET_SHARE_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut share = [0u8; SECRET_SHARE_SIZE];
        share.copy_from_slice(bytes);
        Ok(SecretShare(share))
    }
}

/// ECDH + HKDF-SHA256 down to a one-off key-encryption key
///
/// `own` is the private half on this side; `peer` is the other side's public key.
/// The salt is always `ephemeral || recipient` so both directions agree.
fn derive_kek(
    own: &SecretKey,
    peer: &PublicKey,
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> Result<Secret, SecretShareError> {
    let scalar = Zeroizing::new(own.as_inner().to_nonzero_scalar());
    let shared = k256::ecdh::diffie_hellman(&*scalar, peer.as_inner().as_affine());

    let mut salt = [0u8; PUBLIC_KEY_SIZE * 2];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral.to_bytes());
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(&recipient.to_bytes());

    let hk = Hkdf::<Sha256>::new(Some(&salt[..]), shared.raw_secret_bytes());
    let mut okm = Zeroizing::new([0u8; SECRET_SIZE]);
    hk.expand(KDF_INFO, &mut okm[..])
        .map_err(|_| anyhow::anyhow!("HKDF expand error"))?;

    Ok(Secret::from_slice(&okm[..])?)
}

impl SecretShare {
    /// Parse a share from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, SecretShareError> {
        let hex = super::strip_hex_prefix(hex);
        let mut buff = [0; SECRET_SHARE_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Ok(SecretShare::from(buff))
    }

    /// Convert share to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Wrap a secret for a specific recipient
    ///
    /// # Arguments
    ///
    /// * `secret` - The secret to wrap (an envelope's payload key)
    /// * `recipient` - The public key of the intended recipient
    ///
    /// # Errors
    ///
    /// Returns an error only if key derivation or encryption fails, which does not
    /// happen for well-formed inputs.
    pub fn new(secret: &Secret, recipient: &PublicKey) -> Result<Self, SecretShareError> {
        // Single-use ephemeral keypair, wiped when it goes out of scope
        let ephemeral_private = SecretKey::generate();
        let ephemeral_public = ephemeral_private.public();

        let kek = derive_kek(
            &ephemeral_private,
            recipient,
            &ephemeral_public,
            recipient,
        )?;
        let (wrap_nonce, wrapped) = kek.encrypt(secret.bytes())?;

        // sanity check we're getting `SECRET_SHARE_SIZE` bytes here
        if wrapped.len() != WRAPPED_SECRET_SIZE {
            return Err(anyhow::anyhow!("expected share size is incorrect").into());
        }

        let mut share = [0u8; SECRET_SHARE_SIZE];
        share[..NONCE_OFFSET].copy_from_slice(&ephemeral_public.to_bytes());
        share[NONCE_OFFSET..WRAPPED_OFFSET].copy_from_slice(wrap_nonce.bytes());
        share[WRAPPED_OFFSET..].copy_from_slice(&wrapped);

        Ok(SecretShare(share))
    }

    /// Recover the wrapped secret using the recipient's private key
    ///
    /// # Errors
    ///
    /// Returns [`SecretShareError::AuthenticationFailure`] if the share was made for a
    /// different key or has been altered in any byte, including the embedded
    /// ephemeral key. The two cases are deliberately indistinguishable.
    pub fn recover(&self, recipient_secret: &SecretKey) -> Result<Secret, SecretShareError> {
        let ephemeral_public = self
            .ephemeral_public()
            .map_err(|_| SecretShareError::AuthenticationFailure)?;
        let recipient_public = recipient_secret.public();

        let kek = derive_kek(
            recipient_secret,
            &ephemeral_public,
            &ephemeral_public,
            &recipient_public,
        )?;
        let unwrapped = Zeroizing::new(kek.decrypt(self.wrapped_secret(), &self.wrap_nonce())?);

        Ok(Secret::from_slice(&unwrapped)?)
    }

    /// The one-time public key the share was made with
    pub fn ephemeral_public(&self) -> Result<PublicKey, KeyError> {
        PublicKey::from_bytes(&self.0[..NONCE_OFFSET])
    }

    /// The nonce the secret was wrapped under
    pub fn wrap_nonce(&self) -> Nonce {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&self.0[NONCE_OFFSET..WRAPPED_OFFSET]);
        Nonce::from(nonce)
    }

    /// The wrapped secret with its tag
    pub fn wrapped_secret(&self) -> &[u8] {
        &self.0[WRAPPED_OFFSET..]
    }

    /// Get a reference to the raw share bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
