use std::{borrow::Cow, string::FromUtf8Error};

pub type Result<T, E = MichelsonError> = core::result::Result<T, E>;

/// Errors raised while decoding or encoding Micheline trees.
#[derive(Debug, thiserror::Error)]
pub enum MichelsonError {
    /// The input ended in the middle of a node.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A node tag byte is not part of the encoding.
    #[error("invalid tag 0x{0:02x}")]
    InvalidTag(u8),

    /// A 7-bit varint does not fit in 32 bits.
    #[error("7-bit varint overflows 32 bits")]
    VarintOverflow,

    /// A string or annotation is not valid utf-8.
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// An annotation is empty or carries an unknown kind marker.
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(Cow<'static, str>),

    /// A primitive name is not in the opcode table.
    #[error("unknown primitive: {0}")]
    UnknownPrimitive(Cow<'static, str>),

    /// The input continues after a complete node.
    #[error("{0} trailing bytes after node")]
    TrailingBytes(usize),

    /// The tree is nested deeper than the decoders accept.
    #[error("nesting exceeds {0} levels")]
    TooDeep(usize),

    /// A JSON document does not describe a Micheline node.
    #[error("invalid json node: {0}")]
    InvalidJson(Cow<'static, str>),

    /// The JSON text could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The hex text could not be parsed.
    #[error("hex error: {0}")]
    Hex(#[from] const_hex::FromHexError),
}

impl MichelsonError {
    pub(crate) fn invalid_json<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidJson(err.into())
    }
}
