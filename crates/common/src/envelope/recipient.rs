//! # Recipients
//!
//! A recipient entry pairs an identity (the [`Address`] of the recipient's public
//! key) with the [`SecretShare`] wrapped for that key. Entries are looked up by
//! identity, never by position.

use serde::{Deserialize, Serialize};

use crate::crypto::{Address, PublicKey, Secret, SecretShare, SecretShareError};

/// One recipient of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    /// Address of the recipient's public key
    identity: Address,
    /// The envelope secret, wrapped for this recipient
    share: SecretShare,
}

impl Recipient {
    pub fn new(identity: Address, share: SecretShare) -> Self {
        Self { identity, share }
    }

    /// Wrap `secret` for `public_key` and label the result with its address
    pub fn wrap(secret: &Secret, public_key: &PublicKey) -> Result<Self, SecretShareError> {
        Ok(Self {
            identity: public_key.address(),
            share: SecretShare::new(secret, public_key)?,
        })
    }

    pub fn identity(&self) -> &Address {
        &self.identity
    }

    pub fn share(&self) -> &SecretShare {
        &self.share
    }
}
