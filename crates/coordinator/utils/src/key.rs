use core::{fmt, str::FromStr};

use blake2::{Blake2b, Digest, digest::consts::U20};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use tezos_multisig_michelson::Prim;

use crate::{
    Address, EncodingError,
    base58::{self, EDPK, P2PK, Prefix, SPPK},
};

/// Signature scheme of a key, address or signature.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Curve {
    /// Ed25519 (`tz1`, `edpk`, `edsig`)
    Ed25519,
    /// Secp256k1 (`tz2`, `sppk`, `spsig1`)
    Secp256k1,
    /// NIST P-256 (`tz3`, `p2pk`, `p2sig`)
    P256,
}

impl Curve {
    /// Tag byte used in raw encodings.
    pub fn tag(self) -> u8 {
        match self {
            Self::Ed25519 => 0,
            Self::Secp256k1 => 1,
            Self::P256 => 2,
        }
    }

    /// Reads a tag byte.
    pub fn from_tag(tag: u8) -> Result<Self, EncodingError> {
        match tag {
            0 => Ok(Self::Ed25519),
            1 => Ok(Self::Secp256k1),
            2 => Ok(Self::P256),
            _ => Err(EncodingError::InvalidTag(tag)),
        }
    }

    fn key_prefix(self) -> Prefix {
        match self {
            Self::Ed25519 => EDPK,
            Self::Secp256k1 => SPPK,
            Self::P256 => P2PK,
        }
    }
}

/// A public key with its curve.
///
/// Ed25519 keys are 32 bytes; Secp256k1 and P-256 keys are 33-byte compressed points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct PubKey {
    curve: Curve,
    key: Vec<u8>,
}

impl PubKey {
    /// Builds a key from its curve and raw bytes.
    pub fn new(curve: Curve, key: Vec<u8>) -> Result<Self, EncodingError> {
        let expected = curve.key_prefix().data_len;
        if key.len() != expected {
            return Err(EncodingError::InvalidLength { expected, actual: key.len() });
        }

        Ok(Self { curve, key })
    }

    /// Curve of the key.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Raw key bytes without the curve tag.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Raw encoding: curve tag followed by the key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.key.len());
        bytes.push(self.curve.tag());
        bytes.extend_from_slice(&self.key);
        bytes
    }

    /// Reads the raw encoding produced by [`PubKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let (&tag, key) = bytes.split_first().ok_or(EncodingError::other("empty public key"))?;
        Self::new(Curve::from_tag(tag)?, key.to_vec())
    }

    /// Reads a key stored either as raw bytes or as a base58 string.
    pub fn from_prim(prim: &Prim) -> Result<Self, EncodingError> {
        match prim {
            Prim::Bytes(bytes) => Self::from_bytes(bytes),
            Prim::String(text) => text.parse(),
            _ => Err(EncodingError::other("public key must be bytes or string")),
        }
    }

    /// The implicit account controlled by this key.
    pub fn address(&self) -> Address {
        let mut hash = [0; 20];
        hash.copy_from_slice(&Blake2b::<U20>::digest(&self.key));
        Address::implicit(self.curve, hash)
    }
}

impl FromStr for PubKey {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, key) = base58::decode(s, "public key", &[EDPK, SPPK, P2PK])?;

        let curve = [Curve::Ed25519, Curve::Secp256k1, Curve::P256]
            .into_iter()
            .find(|curve| curve.key_prefix() == prefix)
            .unwrap_or(Curve::P256);

        Ok(Self { curve, key })
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.curve.key_prefix(), &self.key))
    }
}
