//! Compact binary encoding used by the indexer for raw contract scripts and storage.
//!
//! Layout of a node:
//!
//! * tag `>= 0x80`: primitive. Next byte is the opcode. Bits 4..=6 hold the argument count
//!   (`7` escapes to a 7-bit varint), bits 0..=3 hold the annotation count (`15` escapes).
//!   Arguments follow, then annotations.
//! * tag `< 0x80`: literal. Bits 5..=6 select int, bytes, string or array; bits 0..=4 hold the
//!   byte length or item count (`31` escapes).
//!
//! Each annotation starts with a byte whose top two bits give its kind and whose low six bits
//! give its length (`63` escapes). Integers are little-endian two's complement.

use num_bigint::BigInt;

use crate::{
    OpCode, Prim,
    error::{MichelsonError, Result},
    reader::{MAX_DEPTH, Reader},
};

const PRIM_FLAG: u8 = 0x80;

const LITERAL_INT: u8 = 0x00;
const LITERAL_BYTES: u8 = 0x20;
const LITERAL_STRING: u8 = 0x40;
const LITERAL_ARRAY: u8 = 0x60;

const ANNOT_FIELD: u8 = 0x40;
const ANNOT_TYPE: u8 = 0x80;
const ANNOT_VARIABLE: u8 = 0xc0;

/// Decodes a single node from compact binary. The whole input must be consumed.
pub fn decode_compact(bytes: &[u8]) -> Result<Prim> {
    let mut reader = Reader::new(bytes);
    let prim = decode(&mut reader, 0)?;
    reader.finish()?;
    Ok(prim)
}

/// Encodes a node into compact binary.
///
/// # Errors
///
/// When an annotation is empty or lacks a `%`, `:` or `@` marker.
pub fn encode_compact(prim: &Prim) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode(prim, &mut buf)?;
    Ok(buf)
}

fn decode(reader: &mut Reader<'_>, depth: usize) -> Result<Prim> {
    if depth > MAX_DEPTH {
        return Err(MichelsonError::TooDeep(MAX_DEPTH));
    }

    let tag = reader.read_u8()?;

    if tag & PRIM_FLAG != 0 {
        let op = OpCode::new(reader.read_u8()?);

        let argc = match (tag & 0x70) >> 4 {
            0x07 => read_7bit_int(reader)?,
            n => u32::from(n),
        };

        let args = (0..argc).map(|_| decode(reader, depth + 1)).collect::<Result<Vec<_>>>()?;

        let annc = match tag & 0x0f {
            0x0f => read_7bit_int(reader)?,
            n => u32::from(n),
        };

        let annots = (0..annc).map(|_| read_annot(reader)).collect::<Result<Vec<_>>>()?;

        return Ok(Prim::new(op, args, annots));
    }

    let len = match tag & 0x1f {
        0x1f => read_7bit_int(reader)? as usize,
        n => usize::from(n),
    };

    let prim = match tag & 0x60 {
        LITERAL_INT => Prim::Int(BigInt::from_signed_bytes_le(reader.read_slice(len)?)),
        LITERAL_BYTES => Prim::Bytes(reader.read_slice(len)?.to_vec()),
        LITERAL_STRING => Prim::String(String::from_utf8(reader.read_slice(len)?.to_vec())?),
        _ => Prim::Seq((0..len).map(|_| decode(reader, depth + 1)).collect::<Result<_>>()?),
    };

    Ok(prim)
}

fn encode(prim: &Prim, buf: &mut Vec<u8>) -> Result<()> {
    match prim {
        Prim::Int(i) => write_literal(LITERAL_INT, &i.to_signed_bytes_le(), buf),
        Prim::Bytes(b) => write_literal(LITERAL_BYTES, b, buf),
        Prim::String(s) => write_literal(LITERAL_STRING, s.as_bytes(), buf),
        Prim::Seq(items) => {
            write_header(LITERAL_ARRAY, 0x1f, items.len(), buf);
            for item in items {
                encode(item, buf)?;
            }
        },
        Prim::Nullary { op, .. }
        | Prim::Unary { op, .. }
        | Prim::Binary { op, .. }
        | Prim::Nary { op, .. } => {
            let (args, annots) = (prim.args(), prim.annots());

            let arg_bits = args.len().min(0x07) as u8;
            let annot_bits = annots.len().min(0x0f) as u8;
            buf.extend([PRIM_FLAG | (arg_bits << 4) | annot_bits, op.code()]);

            if arg_bits == 0x07 {
                write_7bit_int(args.len() as u32, buf);
            }

            for arg in args {
                encode(arg, buf)?;
            }

            if annot_bits == 0x0f {
                write_7bit_int(annots.len() as u32, buf);
            }

            for annot in annots {
                write_annot(annot, buf)?;
            }
        },
    }

    Ok(())
}

fn write_literal(kind: u8, bytes: &[u8], buf: &mut Vec<u8>) {
    write_header(kind, 0x1f, bytes.len(), buf);
    buf.extend_from_slice(bytes);
}

fn write_header(kind: u8, escape: u8, len: usize, buf: &mut Vec<u8>) {
    if len < usize::from(escape) {
        buf.push(kind | len as u8);
    } else {
        buf.push(kind | escape);
        write_7bit_int(len as u32, buf);
    }
}

fn read_annot(reader: &mut Reader<'_>) -> Result<String> {
    let head = reader.read_u8()?;

    let marker = match head & 0xc0 {
        ANNOT_FIELD => '%',
        ANNOT_TYPE => ':',
        ANNOT_VARIABLE => '@',
        _ => return Err(MichelsonError::InvalidAnnotation("unknown annotation kind".into())),
    };

    let len = match head & 0x3f {
        0x3f => read_7bit_int(reader)? as usize,
        n => usize::from(n),
    };

    let text = String::from_utf8(reader.read_slice(len)?.to_vec())?;

    Ok(format!("{marker}{text}"))
}

fn write_annot(annot: &str, buf: &mut Vec<u8>) -> Result<()> {
    let mut chars = annot.chars();

    let kind = match chars.next() {
        Some('%') => ANNOT_FIELD,
        Some(':') => ANNOT_TYPE,
        Some('@') => ANNOT_VARIABLE,
        _ => return Err(MichelsonError::InvalidAnnotation(annot.to_string().into())),
    };

    let text = chars.as_str().as_bytes();
    write_header(kind, 0x3f, text.len(), buf);
    buf.extend_from_slice(text);

    Ok(())
}

/// Reads a little-endian base-128 varint of at most 32 bits.
pub(crate) fn read_7bit_int(reader: &mut Reader<'_>) -> Result<u32> {
    let mut value = 0u32;

    for shift in [0, 7, 14, 21] {
        let byte = reader.read_u8()?;
        value |= u32::from(byte & 0x7f) << shift;

        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }

    let byte = reader.read_u8()?;
    if byte > 0x0f {
        return Err(MichelsonError::VarintOverflow);
    }

    Ok(value | (u32::from(byte) << 28))
}

pub(crate) fn write_7bit_int(mut value: u32, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }

    buf.push(value as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(bytes: &[u8]) -> Result<u32> {
        read_7bit_int(&mut Reader::new(bytes))
    }

    #[test]
    fn varint_limits() {
        assert_eq!(varint(&[0x00]).unwrap(), 0);
        assert_eq!(varint(&[0x7f]).unwrap(), 127);
        assert_eq!(varint(&[0x80, 0x01]).unwrap(), 128);
        assert_eq!(varint(&[0xff, 0xff, 0xff, 0xff, 0x0f]).unwrap(), u32::MAX);
        assert!(matches!(varint(&[0xff, 0xff, 0xff, 0xff, 0x10]), Err(MichelsonError::VarintOverflow)));
        assert!(matches!(varint(&[0x80]), Err(MichelsonError::UnexpectedEof)));

        let mut buf = Vec::new();
        write_7bit_int(300, &mut buf);
        assert_eq!(buf, [0xac, 0x02]);
    }

    #[test]
    fn decodes_annotated_storage_type() {
        // pair (nat %counter) (list %keys key)
        let bytes = [
            0xa0, 0x65, // pair, 2 args, 0 annots
            0x81, 0x62, 0x47, b'c', b'o', b'u', b'n', b't', b'e', b'r', // nat %counter
            0x91, 0x5f, 0x80, 0x5c, 0x44, b'k', b'e', b'y', b's', // list %keys key
        ];

        let prim = decode_compact(&bytes).unwrap();

        assert!(prim.is(OpCode::T_PAIR));
        assert_eq!(prim.args()[0].annots(), ["%counter"]);
        assert!(prim.args()[1].is(OpCode::T_LIST));
        assert_eq!(prim.args()[1].anno(), Some("keys"));
        assert!(prim.args()[1].args()[0].is(OpCode::T_KEY));
    }

    #[test]
    fn annotation_kinds_map_to_markers() {
        let bytes = [0x83, 0x62, 0x41, b'a', 0x81, b'b', 0xc1, b'c'];
        let prim = decode_compact(&bytes).unwrap();
        assert_eq!(prim.annots(), ["%a", ":b", "@c"]);

        assert!(matches!(decode_compact(&[0x81, 0x62, 0x01, b'x']), Err(MichelsonError::InvalidAnnotation(_))));
    }

    #[test]
    fn integers_are_little_endian_twos_complement() {
        assert_eq!(decode_compact(&[0x01, 0x05]).unwrap(), Prim::int(5));
        assert_eq!(decode_compact(&[0x02, 0xc8, 0x00]).unwrap(), Prim::int(200));
        assert_eq!(decode_compact(&[0x01, 0xff]).unwrap(), Prim::int(-1));
        assert_eq!(decode_compact(&[0x00]).unwrap(), Prim::int(0));
    }

    #[test]
    fn round_trips_wide_nodes() {
        let long_text = "x".repeat(100);
        let prim = Prim::new(
            OpCode::D_PAIR,
            (0..9).map(Prim::int).collect(),
            (0..16).map(|i| format!("%a{i}")).collect(),
        );
        let seq = Prim::Seq(vec![prim, Prim::string(long_text), Prim::bytes(vec![7; 40])]);

        let bytes = encode_compact(&seq).unwrap();
        assert_eq!(decode_compact(&bytes).unwrap(), seq);
    }
}
