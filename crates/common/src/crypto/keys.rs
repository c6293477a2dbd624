use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::address::Address;

/// Size of a secp256k1 private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an uncompressed SEC1 public key in bytes (`0x04 || x || y`)
pub const PUBLIC_KEY_SIZE: usize = 65;
/// Size of a compressed SEC1 public key in bytes
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;
/// Size of a "raw" public key: the uncompressed point with its format byte stripped
pub const RAW_PUBLIC_KEY_SIZE: usize = 64;
/// PEM tag used for persisted secret keys
pub const PEM_TAG: &str = "SECP256K1 PRIVATE KEY";

const UNCOMPRESSED_TAG: u8 = 0x04;

/// Errors that can occur during key operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Bad encoding, a point that is not on the curve, or a scalar out of range
    #[error("malformed key: {0}")]
    MalformedKey(String),
}

impl KeyError {
    fn malformed(msg: impl Into<String>) -> Self {
        KeyError::MalformedKey(msg.into())
    }
}

/// Public key used to address a recipient and to wrap secrets for them
///
/// A thin wrapper around a secp256k1 point. Any valid encoding is accepted on the way in:
/// - 65 bytes, uncompressed SEC1 (`0x04 || x || y`)
/// - 64 bytes, the same with the format byte stripped (the form wallets usually print)
/// - 33 bytes, compressed SEC1
///
/// On the way out, [`PublicKey::to_bytes`] is always the 65-byte uncompressed form.
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate();
/// let public_key = secret_key.public();
///
/// let hex = public_key.to_hex();
/// let recovered = PublicKey::from_hex(&hex)?;
/// assert_eq!(public_key, recovered);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<k256::PublicKey> for PublicKey {
    fn from(key: k256::PublicKey) -> Self {
        PublicKey(key)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl PublicKey {
    /// Parse a public key from any supported encoding
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MalformedKey`] if the length is not one of the supported
    /// encodings, or if the bytes do not describe a point on secp256k1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = match bytes.len() {
            RAW_PUBLIC_KEY_SIZE => {
                let mut sec1 = [0u8; PUBLIC_KEY_SIZE];
                sec1[0] = UNCOMPRESSED_TAG;
                sec1[1..].copy_from_slice(bytes);
                k256::PublicKey::from_sec1_bytes(&sec1)
            }
            PUBLIC_KEY_SIZE | COMPRESSED_PUBLIC_KEY_SIZE => {
                k256::PublicKey::from_sec1_bytes(bytes)
            }
            n => {
                return Err(KeyError::malformed(format!(
                    "invalid public key size, expected {}, {} or {}, got {}",
                    COMPRESSED_PUBLIC_KEY_SIZE, RAW_PUBLIC_KEY_SIZE, PUBLIC_KEY_SIZE, n
                )))
            }
        };
        key.map(PublicKey)
            .map_err(|_| KeyError::malformed("public key is not a valid secp256k1 point"))
    }

    /// Parse a public key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = super::strip_hex_prefix(hex);
        let bytes =
            hex::decode(hex).map_err(|_| KeyError::malformed("public key hex decode error"))?;
        Self::from_bytes(&bytes)
    }

    /// Uncompressed SEC1 encoding, 65 bytes
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Uncompressed encoding with the leading format byte stripped, 64 bytes
    ///
    /// This is the byte string addresses are hashed from.
    pub fn to_raw_bytes(&self) -> [u8; RAW_PUBLIC_KEY_SIZE] {
        let mut out = [0u8; RAW_PUBLIC_KEY_SIZE];
        out.copy_from_slice(&self.to_bytes()[1..]);
        out
    }

    /// Hex of the uncompressed encoding, no prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The address this key is known by
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    pub(crate) fn as_inner(&self) -> &k256::PublicKey {
        &self.0
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Secret key for opening envelopes
///
/// A thin wrapper around a secp256k1 scalar. The scalar is wiped from memory when the
/// key is dropped, and `Debug` only ever shows the matching address.
///
/// # Security Considerations
///
/// - Never send this key anywhere
/// - Store it in a protected location (e.g., `~/.multiseal/key.pem`)
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate();
///
/// // Persist to PEM format
/// std::fs::write("key.pem", secret_key.to_pem())?;
///
/// // Load from PEM
/// let pem = std::fs::read_to_string("key.pem")?;
/// let recovered = SecretKey::from_pem(&pem)?;
/// ```
#[derive(Clone)]
pub struct SecretKey(k256::SecretKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("address", &self.public().address())
            .finish_non_exhaustive()
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        // k256 compares scalars in constant time
        self.0 == other.0
    }
}

impl Eq for SecretKey {}

impl SecretKey {
    /// Generate a new random secret key using a cryptographically secure RNG
    ///
    /// Candidates outside `[1, n)` are discarded, so the scalar is uniform over the
    /// valid range.
    pub fn generate() -> Self {
        loop {
            let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
            getrandom::getrandom(&mut bytes[..]).expect("failed to generate random bytes");
            if let Ok(key) = k256::SecretKey::from_slice(&bytes[..]) {
                return Self(key);
            }
        }
    }

    /// Create a secret key from its 32-byte big-endian scalar
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MalformedKey`] if the slice is not 32 bytes or the scalar
    /// is zero or not below the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(KeyError::malformed(format!(
                "invalid private key size, expected {}, got {}",
                PRIVATE_KEY_SIZE,
                bytes.len()
            )));
        }
        k256::SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyError::malformed("private key scalar out of range"))
    }

    /// Parse a secret key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = hex.trim();
        let hex = super::strip_hex_prefix(hex);
        let mut buff = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        hex::decode_to_slice(hex, &mut buff[..])
            .map_err(|_| KeyError::malformed("private key hex decode error"))?;
        Self::from_bytes(&buff[..])
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// The 32-byte scalar, wiped when the returned buffer is dropped
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    /// Convert secret key to hexadecimal string
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.to_bytes()[..]))
    }

    /// Encode secret key in PEM format for storage
    ///
    /// Returns a PEM-encoded string with tag [`PEM_TAG`].
    pub fn to_pem(&self) -> Zeroizing<String> {
        let pem = pem::Pem::new(PEM_TAG, self.to_bytes().to_vec());
        Zeroizing::new(pem::encode(&pem))
    }

    /// Parse a secret key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not [`PEM_TAG`]
    /// - The key size is incorrect or the scalar is out of range
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| KeyError::malformed(format!("failed to parse PEM: {}", e)))?;

        if pem.tag() != PEM_TAG {
            return Err(KeyError::malformed(format!(
                "invalid PEM tag, expected {}",
                PEM_TAG
            )));
        }

        Self::from_bytes(pem.contents())
    }

    pub(crate) fn as_inner(&self) -> &k256::SecretKey {
        &self.0
    }
}

/// A secret key together with its public key
///
/// The public half is computed once at construction, so `public == secret·G` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl From<SecretKey> for KeyPair {
    fn from(secret: SecretKey) -> Self {
        let public = secret.public();
        Self { secret, public }
    }
}

impl KeyPair {
    /// Generate a fresh key pair
    pub fn generate() -> Self {
        SecretKey::generate().into()
    }

    /// Generate `count` independent key pairs
    pub fn generate_many(count: usize) -> Vec<Self> {
        (0..count).map(|_| Self::generate()).collect()
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn address(&self) -> Address {
        self.public.address()
    }

    /// Split into its halves
    pub fn into_parts(self) -> (SecretKey, PublicKey) {
        (self.secret, self.public)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let private_key = SecretKey::generate();
        let public_key = private_key.public();

        // Test round-trip conversion
        let private_hex = private_key.to_hex();
        let recovered_private = SecretKey::from_hex(&private_hex).unwrap();
        assert_eq!(private_key, recovered_private);

        let public_hex = public_key.to_hex();
        let recovered_public = PublicKey::from_hex(&public_hex).unwrap();
        assert_eq!(public_key, recovered_public);
    }

    #[test]
    fn test_pem_serialization() {
        let private_key = SecretKey::generate();

        let pem = private_key.to_pem();
        let recovered_private = SecretKey::from_pem(&pem).unwrap();
        assert_eq!(private_key, recovered_private);
        assert_eq!(private_key.public(), recovered_private.public());
    }

    #[test]
    fn test_pem_wrong_tag() {
        let pem = pem::encode(&pem::Pem::new("PRIVATE KEY", vec![1u8; PRIVATE_KEY_SIZE]));
        assert!(matches!(
            SecretKey::from_pem(&pem),
            Err(KeyError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_public_key_encodings_agree() {
        let public_key = SecretKey::generate().public();

        let uncompressed = public_key.to_bytes();
        assert_eq!(uncompressed[0], 0x04);
        let raw = public_key.to_raw_bytes();
        assert_eq!(&uncompressed[1..], &raw[..]);

        let compressed = public_key.0.to_encoded_point(true);
        assert_eq!(compressed.as_bytes().len(), COMPRESSED_PUBLIC_KEY_SIZE);

        assert_eq!(PublicKey::from_bytes(&uncompressed).unwrap(), public_key);
        assert_eq!(PublicKey::from_bytes(&raw).unwrap(), public_key);
        assert_eq!(
            PublicKey::from_bytes(compressed.as_bytes()).unwrap(),
            public_key
        );
    }

    #[test]
    fn test_public_key_rejects_malformed() {
        // undersized
        assert!(PublicKey::from_bytes(&[0x04; 20]).is_err());
        // right size, but not a point on the curve
        let mut bogus = [0xffu8; PUBLIC_KEY_SIZE];
        bogus[0] = 0x04;
        assert!(matches!(
            PublicKey::from_bytes(&bogus),
            Err(KeyError::MalformedKey(_))
        ));
        // the all-zero string is not a valid encoding
        assert!(PublicKey::from_bytes(&[0u8; RAW_PUBLIC_KEY_SIZE]).is_err());
        assert!(PublicKey::from_hex("0xnothex").is_err());
    }

    #[test]
    fn test_secret_key_rejects_out_of_range() {
        assert!(SecretKey::from_bytes(&[0u8; PRIVATE_KEY_SIZE]).is_err());
        assert!(SecretKey::from_bytes(&[0xffu8; PRIVATE_KEY_SIZE]).is_err());
        assert!(SecretKey::from_bytes(&[1u8; 31]).is_err());

        let mut one = [0u8; PRIVATE_KEY_SIZE];
        one[PRIVATE_KEY_SIZE - 1] = 1;
        assert!(SecretKey::from_bytes(&one).is_ok());
    }

    #[test]
    fn test_secret_key_hex_accepts_prefix() {
        let key = SecretKey::generate();
        let prefixed = format!("0x{}", key.to_hex().as_str());
        assert_eq!(SecretKey::from_hex(&prefixed).unwrap(), key);
        let upper = format!("0X{}", key.to_hex().as_str());
        assert_eq!(SecretKey::from_hex(&upper).unwrap(), key);
    }

    #[test]
    fn test_debug_does_not_leak_scalar() {
        let key = SecretKey::generate();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(key.to_hex().as_str()));
    }

    #[test]
    fn test_generate_many() {
        let pairs = KeyPair::generate_many(5);
        assert_eq!(pairs.len(), 5);
        for pair in &pairs {
            assert_eq!(pair.secret().public(), *pair.public());
        }
        for (i, a) in pairs.iter().enumerate() {
            for b in &pairs[i + 1..] {
                assert_ne!(a.public(), b.public());
            }
        }
    }

    #[test]
    fn test_public_key_serde_json_roundtrip() {
        let public_key = SecretKey::generate().public();
        let json = serde_json::to_string(&public_key).unwrap();
        let recovered: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(public_key, recovered);
    }
}
