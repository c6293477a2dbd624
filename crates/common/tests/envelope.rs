//! Integration tests for sealing and opening envelopes

mod common;

use std::collections::HashSet;

use ::common::crypto::{Address, KeyPair, SecretKey, ADDRESS_SIZE};
use ::common::envelope::{Envelope, EnvelopeError};

#[test]
fn test_hello_for_three_recipients() {
    let (recipients, envelope) = common::seal_for(3, b"hello");

    let addresses: HashSet<Address> = recipients.iter().map(KeyPair::address).collect();
    assert_eq!(addresses.len(), 3);
    for address in &addresses {
        assert_eq!(address.as_bytes().len(), ADDRESS_SIZE);
        assert_eq!(address.to_string().len(), 2 + 2 * ADDRESS_SIZE);
    }
    for pair in &recipients {
        // stable across repeated derivation
        assert_eq!(pair.address(), Address::from_public_key(pair.public()));
    }

    assert_eq!(envelope.recipients().len(), 3);
    for pair in &recipients {
        assert!(envelope.contains(&pair.address()));
        assert_eq!(
            envelope.open(pair.secret(), &pair.address()).unwrap(),
            b"hello"
        );
    }
}

#[test]
fn test_empty_payload() {
    let (recipients, envelope) = common::seal_for(2, b"");
    for pair in &recipients {
        assert!(envelope.open_with_key(pair.secret()).unwrap().is_empty());
    }
}

#[test]
fn test_large_payload() {
    let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    let (recipients, envelope) = common::seal_for(2, &payload);
    assert_eq!(envelope.open_with_key(recipients[1].secret()).unwrap(), payload);
}

#[test]
fn test_single_recipient() {
    let (recipients, envelope) = common::seal_for(1, b"just me");
    assert_eq!(
        envelope.open_with_key(recipients[0].secret()).unwrap(),
        b"just me"
    );
}

#[test]
fn test_many_recipients() {
    let (recipients, envelope) = common::seal_for(32, b"broadcast");
    for pair in &recipients {
        assert_eq!(envelope.open_with_key(pair.secret()).unwrap(), b"broadcast");
    }
}

#[test]
fn test_non_recipient_cannot_open() {
    let (_, envelope) = common::seal_for(3, b"members only");
    let outsider = KeyPair::generate();

    assert!(matches!(
        envelope.open(outsider.secret(), &outsider.address()),
        Err(EnvelopeError::RecipientNotFound(address)) if address == outsider.address()
    ));
}

#[test]
fn test_wrong_key_for_listed_identity() {
    let (recipients, envelope) = common::seal_for(3, b"cross");

    // recipient 0's key presented under recipient 1's identity
    let result = envelope.open(recipients[0].secret(), &recipients[1].address());
    assert!(matches!(result, Err(EnvelopeError::AuthenticationFailure)));

    let outsider = SecretKey::generate();
    let result = envelope.open(&outsider, &recipients[2].address());
    assert!(matches!(result, Err(EnvelopeError::AuthenticationFailure)));
}

#[test]
fn test_empty_recipient_list() {
    assert!(matches!(
        Envelope::seal(b"nobody", &[]),
        Err(EnvelopeError::NoRecipients)
    ));
}

#[test]
fn test_duplicate_recipient_anywhere_in_list() {
    let pairs = KeyPair::generate_many(3);
    let mut keys = common::publics(&pairs);
    keys.push(keys[1]);

    match Envelope::seal(b"dup", &keys) {
        Err(EnvelopeError::DuplicateRecipient(address)) => assert_eq!(address, pairs[1].address()),
        other => panic!("expected DuplicateRecipient, got {:?}", other),
    }
}

#[test]
fn test_same_payload_seals_differently() {
    let pairs = KeyPair::generate_many(2);
    let keys = common::publics(&pairs);

    let first = Envelope::seal(b"same", &keys).unwrap();
    let second = Envelope::seal(b"same", &keys).unwrap();

    assert_ne!(first.nonce(), second.nonce());
    assert_ne!(first.ciphertext(), second.ciphertext());
    for (a, b) in first.recipients().iter().zip(second.recipients()) {
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.share(), b.share());
    }
}

#[test]
fn test_payload_nonces_unique_across_seals() {
    let pair = KeyPair::generate();
    let mut nonces = HashSet::new();
    for _ in 0..500 {
        let envelope = Envelope::seal(b"n", &[*pair.public()]).unwrap();
        assert!(nonces.insert(*envelope.nonce()));
    }
}

#[test]
fn test_identity_is_public_key_address() {
    let (recipients, envelope) = common::seal_for(3, b"ids");
    let identities: Vec<Address> = envelope.identities().copied().collect();
    let expected: Vec<Address> = recipients
        .iter()
        .map(|pair| Address::from_public_key(pair.public()))
        .collect();
    assert_eq!(identities, expected);
}

#[test]
fn test_encoded_envelope_opens_for_everyone() {
    let (recipients, envelope) = common::seal_for(3, b"shipped");
    let decoded = Envelope::from_bytes(&envelope.to_bytes()).unwrap();
    for pair in &recipients {
        assert_eq!(decoded.open_with_key(pair.secret()).unwrap(), b"shipped");
    }
}

#[test]
fn test_serde_formats_preserve_envelope() {
    let (recipients, envelope) = common::seal_for(2, b"serde");

    let json = serde_json::to_string(&envelope).unwrap();
    let from_json: Envelope = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, envelope);

    let bin = bincode::serialize(&envelope).unwrap();
    let from_bin: Envelope = bincode::deserialize(&bin).unwrap();
    assert_eq!(
        from_bin.open_with_key(recipients[0].secret()).unwrap(),
        b"serde"
    );
}
