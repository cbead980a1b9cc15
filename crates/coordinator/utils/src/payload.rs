use core::{fmt, str::FromStr};

use blake2::{Blake2b, Digest, digest::consts::U32};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use tezos_multisig_michelson::{MichelsonError, Prim};

use crate::EncodingError;

/// Leading byte of every signed Micheline value.
pub const WATERMARK: u8 = 0x05;

/// Signable bytes: the watermark followed by a forged Micheline value.
///
/// Parsing accepts hex with or without a `0x` prefix and with or without the watermark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Forges `prim` and prepends the watermark.
    pub fn from_prim(prim: &Prim) -> Self {
        let mut bytes = vec![WATERMARK];
        bytes.extend(prim.to_bytes());
        Self(bytes)
    }

    /// The bytes a signer signs, watermark included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The forged value without the watermark.
    pub fn forged(&self) -> &[u8] {
        &self.0[1..]
    }

    /// Decodes the forged value.
    pub fn to_prim(&self) -> Result<Prim, MichelsonError> {
        Prim::from_bytes(self.forged())
    }

    /// Hex BLAKE2b-256 digest of the signable bytes.
    pub fn hash(&self) -> String {
        const_hex::encode(Blake2b::<U32>::digest(&self.0))
    }
}

impl FromStr for Payload {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = const_hex::decode(s.strip_prefix("0x").unwrap_or(s))?;

        match bytes.first() {
            None => Err(EncodingError::other("empty payload")),
            Some(&WATERMARK) if bytes.len() > 1 => Ok(Self(bytes)),
            Some(&WATERMARK) => Err(EncodingError::other("empty payload")),
            Some(_) => Ok(Self([WATERMARK].into_iter().chain(bytes).collect())),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(&self.0))
    }
}
