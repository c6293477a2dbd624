//! # Envelope
//!
//! An envelope is a payload encrypted once and readable by any of its recipients:
//!
//! - **Nonce**: the payload's AES-GCM nonce, stored in the clear
//! - **Ciphertext**: the payload under a fresh [`Secret`], tag appended
//! - **Recipients**: one `(identity, share)` pair per recipient, where the share is
//!   that same secret wrapped for the recipient's public key
//!
//! ## Sealing
//!
//! [`Envelope::seal`] checks the recipient list first (non-empty, no repeated
//! identity) and only then generates the secret, encrypts the payload and wraps
//! the secret once per recipient. The secret is wiped when `seal` returns.
//!
//! ## Opening
//!
//! [`Envelope::open`] finds the entry for the caller's identity, unwraps the secret
//! with the caller's private key and decrypts the payload. A wrong key and a
//! tampered envelope both surface as [`EnvelopeError::AuthenticationFailure`].
//!
//! ## Encoding
//!
//! See [`codec`] for the byte layout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::crypto::{
    Address, KeyError, Nonce, PublicKey, Secret, SecretError, SecretKey, SecretShareError,
    TAG_SIZE,
};

pub mod codec;
mod recipient;

pub use recipient::Recipient;

/// Most recipients a single envelope can carry (the count is encoded as a u16)
pub const MAX_RECIPIENTS: usize = u16::MAX as usize;
/// Largest payload a single envelope can carry (the ciphertext length is encoded as a u32)
pub const MAX_PAYLOAD_SIZE: usize = u32::MAX as usize - TAG_SIZE;

/// Errors that can occur when sealing, opening or decoding an envelope
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("envelope needs at least one recipient")]
    NoRecipients,
    #[error("duplicate recipient {0}")]
    DuplicateRecipient(Address),
    #[error("recipient {0} not found in envelope")]
    RecipientNotFound(Address),
    #[error("too many recipients: {0}, at most {MAX_RECIPIENTS}")]
    TooManyRecipients(usize),
    #[error("payload too large: {0} bytes, at most {MAX_PAYLOAD_SIZE}")]
    PayloadTooLarge(usize),
    /// A tag did not verify, on the wrapped key or on the payload
    #[error("authentication failure")]
    AuthenticationFailure,
    #[error("malformed key: {0}")]
    MalformedKey(String),
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("envelope error: {0}")]
    Default(#[from] anyhow::Error),
}

impl From<KeyError> for EnvelopeError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::MalformedKey(msg) => EnvelopeError::MalformedKey(msg),
        }
    }
}

impl From<SecretError> for EnvelopeError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::AuthenticationFailure => EnvelopeError::AuthenticationFailure,
            other => EnvelopeError::Default(other.into()),
        }
    }
}

impl From<SecretShareError> for EnvelopeError {
    fn from(err: SecretShareError) -> Self {
        match err {
            SecretShareError::AuthenticationFailure => EnvelopeError::AuthenticationFailure,
            SecretShareError::Key(err) => err.into(),
            SecretShareError::Secret(err) => err.into(),
            SecretShareError::Default(err) => EnvelopeError::Default(err),
        }
    }
}

/// A payload sealed for a set of recipients
///
/// # Example
///
/// ```ignore
/// let alice = KeyPair::generate();
/// let bob = KeyPair::generate();
///
/// let envelope = Envelope::seal(b"hello", &[*alice.public(), *bob.public()])?;
///
/// let plaintext = envelope.open(bob.secret(), &bob.address())?;
/// assert_eq!(plaintext, b"hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnvelopeParts", into = "EnvelopeParts")]
pub struct Envelope {
    /// Nonce the payload was encrypted under
    nonce: Nonce,
    /// Encrypted payload with its tag
    ciphertext: Vec<u8>,
    /// Recipient entries, in the order they were given to `seal`
    recipients: Vec<Recipient>,
}

/// Unchecked form used for (de)serialization
#[derive(Serialize, Deserialize)]
struct EnvelopeParts {
    nonce: Nonce,
    ciphertext: Vec<u8>,
    recipients: Vec<Recipient>,
}

impl TryFrom<EnvelopeParts> for Envelope {
    type Error = EnvelopeError;
    fn try_from(parts: EnvelopeParts) -> Result<Self, Self::Error> {
        Envelope::from_parts(parts.nonce, parts.ciphertext, parts.recipients)
    }
}

impl From<Envelope> for EnvelopeParts {
    fn from(envelope: Envelope) -> Self {
        EnvelopeParts {
            nonce: envelope.nonce,
            ciphertext: envelope.ciphertext,
            recipients: envelope.recipients,
        }
    }
}

/// Reject empty, oversized and repeated identity lists
fn check_identities<'a>(
    identities: impl ExactSizeIterator<Item = &'a Address>,
) -> Result<(), EnvelopeError> {
    let count = identities.len();
    if count == 0 {
        return Err(EnvelopeError::NoRecipients);
    }
    if count > MAX_RECIPIENTS {
        return Err(EnvelopeError::TooManyRecipients(count));
    }
    let mut seen = HashSet::with_capacity(count);
    for identity in identities {
        if !seen.insert(identity) {
            return Err(EnvelopeError::DuplicateRecipient(*identity));
        }
    }
    Ok(())
}

impl Envelope {
    /// Encrypt `plaintext` once and wrap its key for every recipient
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::NoRecipients`] if `recipients` is empty
    /// - [`EnvelopeError::DuplicateRecipient`] if two keys share an address
    /// - [`EnvelopeError::TooManyRecipients`] / [`EnvelopeError::PayloadTooLarge`] if
    ///   the envelope could not be encoded
    ///
    /// All of these are checked before any key material is generated.
    pub fn seal(plaintext: &[u8], recipients: &[PublicKey]) -> Result<Self, EnvelopeError> {
        let identities: Vec<Address> = recipients.iter().map(PublicKey::address).collect();
        check_identities(identities.iter())?;
        if plaintext.len() > MAX_PAYLOAD_SIZE {
            return Err(EnvelopeError::PayloadTooLarge(plaintext.len()));
        }

        let secret = Secret::generate();
        let (nonce, ciphertext) = secret.encrypt(plaintext)?;

        let recipients = recipients
            .iter()
            .map(|public_key| Recipient::wrap(&secret, public_key))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            recipients = recipients.len(),
            ciphertext_len = ciphertext.len(),
            "sealed envelope"
        );

        Ok(Self {
            nonce,
            ciphertext,
            recipients,
        })
    }

    /// Assemble an envelope from already-sealed parts
    ///
    /// Enforces the same invariants as [`Envelope::seal`], plus a ciphertext at
    /// least as long as the tag.
    pub fn from_parts(
        nonce: Nonce,
        ciphertext: Vec<u8>,
        recipients: Vec<Recipient>,
    ) -> Result<Self, EnvelopeError> {
        check_identities(recipients.iter().map(Recipient::identity))?;
        if ciphertext.len() < TAG_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "ciphertext shorter than the {} byte tag",
                TAG_SIZE
            )));
        }
        if ciphertext.len() > u32::MAX as usize {
            return Err(EnvelopeError::PayloadTooLarge(ciphertext.len() - TAG_SIZE));
        }
        Ok(Self {
            nonce,
            ciphertext,
            recipients,
        })
    }

    /// Decrypt the payload as the recipient known by `identity`
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::RecipientNotFound`] if no entry carries `identity`
    /// - [`EnvelopeError::AuthenticationFailure`] if `secret_key` does not open that
    ///   entry, or if any part of the envelope was altered
    pub fn open(&self, secret_key: &SecretKey, identity: &Address) -> Result<Vec<u8>, EnvelopeError> {
        let recipient = self
            .recipient(identity)
            .ok_or(EnvelopeError::RecipientNotFound(*identity))?;

        let secret = recipient.share().recover(secret_key)?;
        let plaintext = secret.decrypt(&self.ciphertext, &self.nonce)?;

        tracing::debug!(%identity, plaintext_len = plaintext.len(), "opened envelope");
        Ok(plaintext)
    }

    /// Decrypt the payload as the owner of `secret_key`, using its own address as identity
    pub fn open_with_key(&self, secret_key: &SecretKey) -> Result<Vec<u8>, EnvelopeError> {
        self.open(secret_key, &secret_key.public().address())
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Entry for `identity`, if present
    pub fn recipient(&self, identity: &Address) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.identity() == identity)
    }

    /// Identities of all recipients, in order
    pub fn identities(&self) -> impl Iterator<Item = &Address> {
        self.recipients.iter().map(Recipient::identity)
    }

    pub fn contains(&self, identity: &Address) -> bool {
        self.recipient(identity).is_some()
    }
}
