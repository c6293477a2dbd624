//! Shared test utilities for envelope integration tests
#![allow(dead_code)]

use common::crypto::{KeyPair, PublicKey};
use common::envelope::Envelope;

/// Generate `count` recipients and seal `payload` for all of them
pub fn seal_for(count: usize, payload: &[u8]) -> (Vec<KeyPair>, Envelope) {
    let recipients = KeyPair::generate_many(count);
    let envelope = Envelope::seal(payload, &publics(&recipients)).unwrap();
    (recipients, envelope)
}

pub fn publics(pairs: &[KeyPair]) -> Vec<PublicKey> {
    pairs.iter().map(|pair| *pair.public()).collect()
}

/// Offset of the recipient count in an encoded envelope
pub fn recipient_count_offset(envelope: &Envelope) -> usize {
    common::crypto::NONCE_SIZE + 4 + envelope.ciphertext().len()
}

/// Offset of the `index`th recipient entry in an encoded envelope
pub fn recipient_offset(envelope: &Envelope, index: usize) -> usize {
    recipient_count_offset(envelope) + 2 + index * common::envelope::codec::RECIPIENT_SIZE
}
