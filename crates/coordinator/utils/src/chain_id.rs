use core::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    EncodingError,
    base58::{self, NET},
};

/// Identifier of a Tezos network, such as `NetXdQprcVkpaWU` for mainnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct ChainId([u8; 4]);

impl ChainId {
    /// Raw 4-byte encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl FromStr for ChainId {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, data) = base58::decode(s, "chain id", &[NET])?;

        let mut bytes = [0; 4];
        bytes.copy_from_slice(&data);

        Ok(Self(bytes))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&NET, &self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::ChainId;

    #[test]
    fn decodes_network_id() {
        let chain_id: ChainId = "NetXjD3HPJJjmcd".parse().unwrap();

        assert_eq!(const_hex::encode(chain_id.to_bytes()), "9caecab9");
        assert_eq!(chain_id.to_string(), "NetXjD3HPJJjmcd");
        assert!("KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV".parse::<ChainId>().is_err());
    }
}
