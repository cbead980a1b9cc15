use core::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    Curve, EncodingError,
    base58::{self, EDSIG, P2SIG, Prefix, SIG, SPSIG},
};

/// A 64-byte signature.
///
/// The base58 prefix either names the curve that produced it (`edsig`, `spsig1`, `p2sig`) or is
/// the curve-agnostic `sig`, in which case `curve` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Signature {
    curve: Option<Curve>,
    bytes: [u8; 64],
}

impl Signature {
    /// Builds a signature from raw bytes and the curve its prefix should declare.
    pub fn new(curve: Option<Curve>, bytes: [u8; 64]) -> Self {
        Self { curve, bytes }
    }

    /// Curve declared by the prefix, `None` for the generic prefix.
    pub fn curve(&self) -> Option<Curve> {
        self.curve
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Raw encoding used inside contract parameters.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    fn prefix(&self) -> Prefix {
        match self.curve {
            Some(Curve::Ed25519) => EDSIG,
            Some(Curve::Secp256k1) => SPSIG,
            Some(Curve::P256) => P2SIG,
            None => SIG,
        }
    }
}

impl FromStr for Signature {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, data) = base58::decode(s, "signature", &[EDSIG, SPSIG, P2SIG, SIG])?;

        let curve = [Curve::Ed25519, Curve::Secp256k1, Curve::P256]
            .into_iter()
            .find(|&curve| Self::new(Some(curve), [0; 64]).prefix() == prefix);

        let mut bytes = [0; 64];
        bytes.copy_from_slice(&data);

        Ok(Self { curve, bytes })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.prefix(), &self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDSIG_TEXT: &str = "edsigtwo6iJyKdGMKKFxSqVT6KvhHuJK1whHdZo4rDF5rRhxpYHiZpnpBHtLRs3BEHyfFW3C8cSCQ7Zu55Kr339cN6M8PbeiMEz";

    #[test]
    fn decodes_curve_specific_prefix() {
        let signature: Signature = EDSIG_TEXT.parse().unwrap();

        assert_eq!(signature.curve(), Some(Curve::Ed25519));
        assert_eq!(
            const_hex::encode(signature.to_bytes()),
            "b75be147bbbee4c2cb4b50942453d4c7866da234142537ea70fc3859e4db9e27b731e99c5371ab1d77d6683bcff6a480449011bf52481f98096e322975238c0d"
        );
        assert_eq!(signature.to_string(), EDSIG_TEXT);
    }

    #[test]
    fn generic_prefix_has_no_curve() {
        let signature = Signature::new(None, [7; 64]);
        let text = signature.to_string();

        assert!(text.starts_with("sig"));

        let parsed: Signature = text.parse().unwrap();
        assert_eq!(parsed.curve(), None);
        assert_eq!(parsed, signature);
    }

    #[test]
    fn rejects_keys_as_signatures() {
        assert!(matches!(
            "edpkuNVuqdPhCsrYqkq21qW2hYTSZWMjQQjfyogoPZ2AfqCmonziNh".parse::<Signature>(),
            Err(EncodingError::UnknownPrefix("signature"))
        ));
    }
}
