use core::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use tezos_multisig_michelson::Prim;

use crate::{
    Curve, EncodingError,
    base58::{self, KT1, Prefix, TZ1, TZ2, TZ3},
};

/// A Tezos account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Address {
    /// An account controlled by a key (`tz1`, `tz2`, `tz3`).
    Implicit {
        /// Curve of the controlling key.
        curve: Curve,
        /// BLAKE2b-160 hash of the controlling key.
        hash: [u8; 20],
    },
    /// A smart contract (`KT1`).
    Originated([u8; 20]),
}

impl Address {
    /// Implicit account address.
    pub fn implicit(curve: Curve, hash: [u8; 20]) -> Self {
        Self::Implicit { curve, hash }
    }

    /// Returns `true` for `KT1` addresses.
    pub fn is_originated(&self) -> bool {
        matches!(self, Self::Originated(_))
    }

    /// The 20-byte hash behind the address.
    pub fn hash(&self) -> &[u8; 20] {
        match self {
            Self::Implicit { hash, .. } | Self::Originated(hash) => hash,
        }
    }

    /// Raw 22-byte encoding: `00 ‖ curve tag ‖ hash` for implicit accounts, `01 ‖ hash ‖ 00` for
    /// contracts.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(22);

        match self {
            Self::Implicit { curve, hash } => {
                bytes.extend([0x00, curve.tag()]);
                bytes.extend_from_slice(hash);
            },
            Self::Originated(hash) => {
                bytes.push(0x01);
                bytes.extend_from_slice(hash);
                bytes.push(0x00);
            },
        }

        bytes
    }

    /// Reads the raw encoding produced by [`Address::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != 22 {
            return Err(EncodingError::InvalidLength { expected: 22, actual: bytes.len() });
        }

        let mut hash = [0; 20];

        match bytes[0] {
            0x00 => {
                let curve = Curve::from_tag(bytes[1])?;
                hash.copy_from_slice(&bytes[2..]);
                Ok(Self::Implicit { curve, hash })
            },
            0x01 => {
                hash.copy_from_slice(&bytes[1..21]);
                Ok(Self::Originated(hash))
            },
            tag => Err(EncodingError::InvalidTag(tag)),
        }
    }

    /// Raw 21-byte key hash encoding, `curve tag ‖ hash`, as used by `key_hash` values.
    ///
    /// # Errors
    ///
    /// When the address is a contract, which has no key hash.
    pub fn to_key_hash_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        match self {
            Self::Implicit { .. } => Ok(self.to_bytes().split_off(1)),
            Self::Originated(_) => Err(EncodingError::other("contract address is not a key hash")),
        }
    }

    /// Reads an address stored either as raw bytes or as a base58 string.
    pub fn from_prim(prim: &Prim) -> Result<Self, EncodingError> {
        match prim {
            Prim::Bytes(bytes) => Self::from_bytes(bytes),
            Prim::String(text) => text.parse(),
            _ => Err(EncodingError::other("address must be bytes or string")),
        }
    }

    fn prefix(&self) -> Prefix {
        match self {
            Self::Implicit { curve: Curve::Ed25519, .. } => TZ1,
            Self::Implicit { curve: Curve::Secp256k1, .. } => TZ2,
            Self::Implicit { curve: Curve::P256, .. } => TZ3,
            Self::Originated(_) => KT1,
        }
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, data) = base58::decode(s, "address", &[TZ1, TZ2, TZ3, KT1])?;

        let mut hash = [0; 20];
        hash.copy_from_slice(&data);

        let address = if prefix == TZ1 {
            Self::implicit(Curve::Ed25519, hash)
        } else if prefix == TZ2 {
            Self::implicit(Curve::Secp256k1, hash)
        } else if prefix == TZ3 {
            Self::implicit(Curve::P256, hash)
        } else {
            Self::Originated(hash)
        };

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.prefix(), self.hash()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PubKey;

    fn hex(address: &str) -> String {
        const_hex::encode(address.parse::<Address>().unwrap().to_bytes())
    }

    #[test]
    fn raw_encodings() {
        assert_eq!(
            hex("KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV"),
            "017f1df41f643db8039663fd5eb3b025e07efbaf3d00"
        );
        assert_eq!(
            hex("tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH"),
            "0000c06b6aa5308a9a89a628ebb8234d5055bf9ba1d0"
        );
        assert_eq!(
            hex("tz1NkT6YCFS3mDo6kfaMFKFrRiA7w2o5dkWp"),
            "0000221f3e8f57fccf16203bbd5f27590d365b190084"
        );
    }

    #[test]
    fn round_trips_text_and_bytes() {
        for text in ["KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV", "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH"] {
            let address: Address = text.parse().unwrap();
            assert_eq!(address.to_string(), text);
            assert_eq!(Address::from_bytes(&address.to_bytes()).unwrap(), address);
            assert_eq!(Address::from_prim(&Prim::string(text)).unwrap(), address);
        }

        assert!(Address::from_bytes(&[0x02; 22]).is_err());
        assert!(Address::from_bytes(&[0x00; 21]).is_err());
    }

    #[test]
    fn key_hash_drops_account_tag() {
        let implicit: Address = "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH".parse().unwrap();
        assert_eq!(
            const_hex::encode(implicit.to_key_hash_bytes().unwrap()),
            "00c06b6aa5308a9a89a628ebb8234d5055bf9ba1d0"
        );

        let contract: Address = "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV".parse().unwrap();
        assert!(contract.to_key_hash_bytes().is_err());
    }

    #[test]
    fn implicit_address_matches_key_curve() {
        let key: PubKey = "sppk7d8CHGV9SCVDi9ciUVAyGTSLExWRSBAJN4vcFpqWEYbWf9ZNr8D".parse().unwrap();
        let address = key.address();

        assert!(address.to_string().starts_with("tz2"));
        assert!(!address.is_originated());
    }
}
