//! Address derivation
//!
//! An address is the short fingerprint a recipient is known by:
//! the last 20 bytes of `keccak256(raw_public_key)`, where the raw key is the
//! 64-byte uncompressed point without its `0x04` format byte. Rendered as `0x`
//! followed by 40 lowercase hex characters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::keys::{KeyError, PublicKey};

/// Size of an address in bytes
pub const ADDRESS_SIZE: usize = 20;
/// Display prefix for addresses
pub const ADDRESS_PREFIX: &str = "0x";

/// 20-byte fingerprint of a public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Derive the address of an already-validated public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Keccak256::digest(public_key.to_raw_bytes());
        let mut out = [0u8; ADDRESS_SIZE];
        out.copy_from_slice(&digest[digest.len() - ADDRESS_SIZE..]);
        Address(out)
    }

    /// Derive the address of an encoded public key
    ///
    /// Any encoding [`PublicKey::from_bytes`] accepts is fine; the result does not
    /// depend on which one is used.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MalformedKey`] for undersized, oversized or off-curve input.
    pub fn derive(public_key: &[u8]) -> Result<Self, KeyError> {
        PublicKey::from_bytes(public_key).map(|key| Self::from_public_key(&key))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Lowercase hex without the prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse an address, with or without a `0x` / `0X` prefix, in either case
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = super::strip_hex_prefix(hex);
        let mut buff = [0u8; ADDRESS_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| KeyError::MalformedKey("address hex decode error".to_string()))?;
        Ok(Address(buff))
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }
}

impl From<&PublicKey> for Address {
    fn from(public_key: &PublicKey) -> Self {
        Self::from_public_key(public_key)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = KeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
