//! Byte encoding for envelopes
//!
//! All integers are big-endian:
//!
//! ```text
//! nonce            12 bytes
//! ciphertext_len    4 bytes (u32)
//! ciphertext        ciphertext_len bytes, tag included
//! recipient_count   2 bytes (u16)
//! recipient_count times:
//!   identity       20 bytes
//!   share         125 bytes (ephemeral key 65 | wrap nonce 12 | wrapped secret 48)
//! ```
//!
//! Decoding is strict: truncated input, trailing bytes, an empty or repeated
//! recipient list and a ciphertext shorter than the tag are all rejected as
//! [`EnvelopeError::Malformed`] (or the matching invariant error).

use crate::crypto::{Address, Nonce, SecretShare, ADDRESS_SIZE, NONCE_SIZE, SECRET_SHARE_SIZE};

use super::{Envelope, EnvelopeError, Recipient};

/// Encoded size of one recipient entry
pub const RECIPIENT_SIZE: usize = ADDRESS_SIZE + SECRET_SHARE_SIZE;

const LEN_SIZE: usize = 4;
const COUNT_SIZE: usize = 2;

/// Cursor over the input that refuses to read past its end
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], EnvelopeError> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(EnvelopeError::Malformed(format!(
                "truncated {}: need {} bytes, have {}",
                what, len, remaining
            )));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], EnvelopeError> {
        let mut buff = [0u8; N];
        buff.copy_from_slice(self.take(N, what)?);
        Ok(buff)
    }

    fn finish(self) -> Result<(), EnvelopeError> {
        let trailing = self.data.len() - self.offset;
        if trailing != 0 {
            return Err(EnvelopeError::Malformed(format!(
                "{} trailing bytes",
                trailing
            )));
        }
        Ok(())
    }
}

impl Envelope {
    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        NONCE_SIZE
            + LEN_SIZE
            + self.ciphertext().len()
            + COUNT_SIZE
            + self.recipients().len() * RECIPIENT_SIZE
    }

    /// Encode the envelope into its byte layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(self.nonce().bytes());
        // both lengths were bounded when the envelope was built
        out.extend_from_slice(&(self.ciphertext().len() as u32).to_be_bytes());
        out.extend_from_slice(self.ciphertext());
        out.extend_from_slice(&(self.recipients().len() as u16).to_be_bytes());
        for recipient in self.recipients() {
            out.extend_from_slice(recipient.identity().as_bytes());
            out.extend_from_slice(recipient.share().bytes());
        }
        out
    }

    /// Decode an envelope from its byte layout
    pub fn from_bytes(data: &[u8]) -> Result<Self, EnvelopeError> {
        let mut reader = Reader::new(data);

        let nonce = Nonce::from(reader.take_array::<NONCE_SIZE>("nonce")?);
        let ciphertext_len =
            u32::from_be_bytes(reader.take_array::<LEN_SIZE>("ciphertext length")?) as usize;
        let ciphertext = reader.take(ciphertext_len, "ciphertext")?.to_vec();

        let count = u16::from_be_bytes(reader.take_array::<COUNT_SIZE>("recipient count")?) as usize;
        // the count is untrusted until the entries it promises are actually there
        if count * RECIPIENT_SIZE > reader.remaining() {
            return Err(EnvelopeError::Malformed(format!(
                "truncated recipients: {} entries need {} bytes, have {}",
                count,
                count * RECIPIENT_SIZE,
                reader.remaining()
            )));
        }
        let mut recipients = Vec::with_capacity(count);
        for _ in 0..count {
            let identity = Address::from(reader.take_array::<ADDRESS_SIZE>("identity")?);
            let share = SecretShare::from(reader.take_array::<SECRET_SHARE_SIZE>("secret share")?);
            recipients.push(Recipient::new(identity, share));
        }
        reader.finish()?;

        Envelope::from_parts(nonce, ciphertext, recipients)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decode from hex, with or without a `0x` / `0X` prefix
    pub fn from_hex(hex: &str) -> Result<Self, EnvelopeError> {
        let hex = hex.trim();
        let hex = crate::crypto::strip_hex_prefix(hex);
        let bytes = hex::decode(hex)
            .map_err(|e| EnvelopeError::Malformed(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}
