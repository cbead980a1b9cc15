use crate::EncodingError;

/// A base58check prefix: the human-readable start of the string, the bytes that produce it and
/// the size of the data that follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Prefix {
    pub(crate) text: &'static str,
    bytes: &'static [u8],
    pub(crate) data_len: usize,
}

macro_rules! prefix {
    ($name:ident, $text:literal, [$($byte:literal),+], $len:literal) => {
        pub(crate) const $name: Prefix = Prefix { text: $text, bytes: &[$($byte),+], data_len: $len };
    };
}

prefix!(TZ1, "tz1", [6, 161, 159], 20);
prefix!(TZ2, "tz2", [6, 161, 161], 20);
prefix!(TZ3, "tz3", [6, 161, 164], 20);
prefix!(KT1, "KT1", [2, 90, 121], 20);
prefix!(EDPK, "edpk", [13, 15, 37, 217], 32);
prefix!(SPPK, "sppk", [3, 254, 226, 86], 33);
prefix!(P2PK, "p2pk", [3, 178, 139, 127], 33);
prefix!(EDSIG, "edsig", [9, 245, 205, 134, 18], 64);
prefix!(SPSIG, "spsig1", [13, 115, 101, 19, 63], 64);
prefix!(P2SIG, "p2sig", [54, 240, 44, 52], 64);
prefix!(SIG, "sig", [4, 130, 43], 64);
prefix!(NET, "Net", [87, 82, 0], 4);

/// Encodes `data` with `prefix` as base58check.
pub(crate) fn encode(prefix: &Prefix, data: &[u8]) -> String {
    let mut raw = Vec::with_capacity(prefix.bytes.len() + data.len());
    raw.extend_from_slice(prefix.bytes);
    raw.extend_from_slice(data);
    bs58::encode(raw).with_check().into_string()
}

/// Decodes a base58check string whose prefix is one of `candidates`, returning the matched
/// prefix and the data behind it.
pub(crate) fn decode(
    text: &str,
    kind: &'static str,
    candidates: &[Prefix],
) -> Result<(Prefix, Vec<u8>), EncodingError> {
    let raw = bs58::decode(text).with_check(None).into_vec()?;

    let prefix = candidates
        .iter()
        .find(|p| raw.starts_with(p.bytes))
        .ok_or(EncodingError::UnknownPrefix(kind))?;

    let data = &raw[prefix.bytes.len()..];
    if data.len() != prefix.data_len {
        return Err(EncodingError::InvalidLength { expected: prefix.data_len, actual: data.len() });
    }

    Ok((*prefix, data.to_vec()))
}
