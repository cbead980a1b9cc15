use std::borrow::Cow;

/// Error that occurs while decoding a base58check string or a raw byte encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// Base58 or checksum error
    #[error("base58 error: {0}")]
    Base58(#[from] bs58::decode::Error),

    /// The decoded bytes do not start with an expected prefix.
    #[error("unknown prefix for {0}")]
    UnknownPrefix(&'static str),

    /// The payload after the prefix has the wrong size.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// A curve or address tag byte is not recognized.
    #[error("invalid tag 0x{0:02x}")]
    InvalidTag(u8),

    /// Hex error
    #[error("hex error: {0}")]
    Hex(#[from] const_hex::FromHexError),

    /// Other error
    #[error("{0}")]
    Other(Cow<'static, str>),
}

impl EncodingError {
    pub(crate) fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

/// Error that occurs while verifying a signature.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The signature prefix names a curve other than the key's.
    #[error("signature curve {signature} does not match key curve {key}")]
    CurveMismatch {
        /// Curve declared by the signature.
        signature: &'static str,
        /// Curve of the public key.
        key: &'static str,
    },

    /// The key bytes are not a point on the curve.
    #[error("malformed public key")]
    MalformedKey,

    /// The signature bytes are not well formed for the curve.
    #[error("malformed signature")]
    MalformedSignature,

    /// The signature does not match the message and key.
    #[error("signature verification failed")]
    Invalid,
}
