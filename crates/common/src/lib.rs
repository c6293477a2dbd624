/**
 * Cryptographic types and operations.
 *  - secp256k1 keypairs and the addresses
 *    they are known by
 *  - Symmetric payload encryption
 *  - Key-to-key secret sharing (ECIES)
 */
pub mod crypto;
/**
 * Multi-recipient envelopes: a payload
 *  encrypted once, with its key wrapped
 *  for every recipient, and the byte
 *  layout envelopes travel in.
 */
pub mod envelope;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{Address, KeyPair, PublicKey, SecretKey};
    pub use crate::envelope::{Envelope, EnvelopeError, Recipient};
    pub use crate::version::build_info;
}
