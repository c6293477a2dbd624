//! Cryptographic primitives for multiseal
//!
//! This module provides the building blocks of an envelope:
//!
//! - **Identity**: secp256k1 keypairs ([`SecretKey`]/[`PublicKey`]) and the 20-byte
//!   [`Address`] each public key is known by
//! - **Payload encryption**: AES-256-GCM under a per-envelope [`Secret`]
//! - **Key wrapping**: ECIES ([`SecretShare`]) to hand that secret to each recipient
//!
//! # Suite
//!
//! | concern | choice |
//! |---|---|
//! | curve | secp256k1 |
//! | payload AEAD | AES-256-GCM, 96-bit random nonce, no AAD |
//! | key agreement | ephemeral-static ECDH |
//! | KDF | HKDF-SHA256 |
//! | key wrap AEAD | AES-256-GCM |
//! | address hash | Keccak-256, last 20 bytes |
//!
//! # Key Hygiene
//!
//! Secret scalars, payload keys and derived key-encryption keys all live in types
//! that wipe themselves on drop, so they are cleared on every exit path.

mod address;
mod keys;
mod secret;
mod secret_share;

pub use address::{Address, ADDRESS_PREFIX, ADDRESS_SIZE};
pub use keys::{
    KeyError, KeyPair, PublicKey, SecretKey, COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE,
    PUBLIC_KEY_SIZE, RAW_PUBLIC_KEY_SIZE,
};
pub use secret::{Nonce, Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
pub use secret_share::{SecretShare, SecretShareError, KDF_INFO, SECRET_SHARE_SIZE};

/// Human-readable name of the algorithm suite
pub const SUITE: &str = "secp256k1+HKDF-SHA256+AES-256-GCM";

/// Strip an optional `0x` / `0X` prefix from a hex string
pub(crate) fn strip_hex_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex)
}
