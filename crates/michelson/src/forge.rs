//! Forged (standard Micheline) binary encoding.
//!
//! This is the encoding the protocol hashes and signs: the multisig payloads and any custom
//! hex payload supplied by a caller use it.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::{
    OpCode, Prim,
    error::{MichelsonError, Result},
    reader::{MAX_DEPTH, Reader},
};

const INT: u8 = 0x00;
const STRING: u8 = 0x01;
const SEQ: u8 = 0x02;
const PRIM_0: u8 = 0x03;
const PRIM_0_ANNOTS: u8 = 0x04;
const PRIM_1: u8 = 0x05;
const PRIM_1_ANNOTS: u8 = 0x06;
const PRIM_2: u8 = 0x07;
const PRIM_2_ANNOTS: u8 = 0x08;
const PRIM_N: u8 = 0x09;
const BYTES: u8 = 0x0a;

impl Prim {
    /// Forges the node into standard Micheline binary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        encode(self, &mut buf);
        buf
    }

    /// Parses a single node from standard Micheline binary. The whole input must be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let prim = decode(&mut reader, 0)?;
        reader.finish()?;
        Ok(prim)
    }
}

fn encode(prim: &Prim, buf: &mut Vec<u8>) {
    match prim {
        Prim::Int(i) => {
            buf.push(INT);
            write_zarith(i, buf);
        },
        Prim::String(s) => {
            buf.push(STRING);
            write_len_prefixed(s.as_bytes(), buf);
        },
        Prim::Bytes(b) => {
            buf.push(BYTES);
            write_len_prefixed(b, buf);
        },
        Prim::Seq(items) => {
            buf.push(SEQ);
            write_nested(buf, |buf| items.iter().for_each(|item| encode(item, buf)));
        },
        Prim::Nullary { op, annots } => {
            buf.extend([if annots.is_empty() { PRIM_0 } else { PRIM_0_ANNOTS }, op.code()]);
            write_annots(annots, buf);
        },
        Prim::Unary { op, arg, annots } => {
            buf.extend([if annots.is_empty() { PRIM_1 } else { PRIM_1_ANNOTS }, op.code()]);
            encode(arg, buf);
            write_annots(annots, buf);
        },
        Prim::Binary { op, args, annots } => {
            buf.extend([if annots.is_empty() { PRIM_2 } else { PRIM_2_ANNOTS }, op.code()]);
            encode(&args[0], buf);
            encode(&args[1], buf);
            write_annots(annots, buf);
        },
        Prim::Nary { op, args, annots } => {
            buf.extend([PRIM_N, op.code()]);
            write_nested(buf, |buf| args.iter().for_each(|arg| encode(arg, buf)));
            write_len_prefixed(annots.join(" ").as_bytes(), buf);
        },
    }
}

fn decode(reader: &mut Reader<'_>, depth: usize) -> Result<Prim> {
    if depth > MAX_DEPTH {
        return Err(MichelsonError::TooDeep(MAX_DEPTH));
    }

    let tag = reader.read_u8()?;

    let prim = match tag {
        INT => Prim::Int(read_zarith(reader)?),
        STRING => Prim::String(String::from_utf8(read_len_prefixed(reader)?.to_vec())?),
        BYTES => Prim::Bytes(read_len_prefixed(reader)?.to_vec()),
        SEQ => Prim::Seq(decode_all(read_len_prefixed(reader)?, depth)?),
        PRIM_0..=PRIM_2_ANNOTS => {
            let op = OpCode::new(reader.read_u8()?);
            let argc = usize::from((tag - PRIM_0) / 2);

            let args = (0..argc).map(|_| decode(reader, depth + 1)).collect::<Result<Vec<_>>>()?;

            let annots = match (tag - PRIM_0) % 2 {
                0 => Vec::new(),
                _ => split_annots(read_len_prefixed(reader)?)?,
            };

            Prim::new(op, args, annots)
        },
        PRIM_N => {
            let op = OpCode::new(reader.read_u8()?);
            let args = decode_all(read_len_prefixed(reader)?, depth)?;
            let annots = split_annots(read_len_prefixed(reader)?)?;

            Prim::new(op, args, annots)
        },
        _ => return Err(MichelsonError::InvalidTag(tag)),
    };

    Ok(prim)
}

fn decode_all(bytes: &[u8], depth: usize) -> Result<Vec<Prim>> {
    let mut reader = Reader::new(bytes);
    let mut items = Vec::new();

    while !reader.is_empty() {
        items.push(decode(&mut reader, depth + 1)?);
    }

    Ok(items)
}

fn write_annots(annots: &[String], buf: &mut Vec<u8>) {
    if !annots.is_empty() {
        write_len_prefixed(annots.join(" ").as_bytes(), buf);
    }
}

fn split_annots(bytes: &[u8]) -> Result<Vec<String>> {
    let text = String::from_utf8(bytes.to_vec())?;
    Ok(text.split(' ').filter(|a| !a.is_empty()).map(String::from).collect())
}

fn write_nested(buf: &mut Vec<u8>, body: impl FnOnce(&mut Vec<u8>)) {
    let start = buf.len();
    buf.extend([0; 4]);
    body(buf);

    // payloads are orders of magnitude below the 4 GiB a length prefix can describe
    let len = (buf.len() - start - 4) as u32;
    buf[start..start + 4].copy_from_slice(&len.to_be_bytes());
}

fn write_len_prefixed(bytes: &[u8], buf: &mut Vec<u8>) {
    write_nested(buf, |buf| buf.extend_from_slice(bytes));
}

fn read_len_prefixed<'a>(reader: &mut Reader<'a>) -> Result<&'a [u8]> {
    let len = reader.read_u32_be()?;
    reader.read_slice(len as usize)
}

/// Writes a zarith integer: six data bits and the sign in the first byte, seven data bits in
/// every following byte, little-endian, high bit set while more bytes follow.
pub(crate) fn write_zarith(value: &BigInt, buf: &mut Vec<u8>) {
    let mut magnitude = value.magnitude().clone();

    let mut first = low_bits(&magnitude, 0x3f);
    if value.sign() == Sign::Minus {
        first |= 0x40;
    }

    magnitude >>= 6;

    if magnitude.is_zero() {
        buf.push(first);
        return;
    }

    buf.push(first | 0x80);

    loop {
        let byte = low_bits(&magnitude, 0x7f);
        magnitude >>= 7;

        if magnitude.is_zero() {
            buf.push(byte);
            return;
        }

        buf.push(byte | 0x80);
    }
}

pub(crate) fn read_zarith(reader: &mut Reader<'_>) -> Result<BigInt> {
    let first = reader.read_u8()?;
    let negative = first & 0x40 != 0;

    let mut magnitude = BigUint::from(first & 0x3f);
    let mut shift = 6;
    let mut more = first & 0x80 != 0;

    while more {
        let byte = reader.read_u8()?;
        magnitude |= BigUint::from(byte & 0x7f) << shift;
        shift += 7;
        more = byte & 0x80 != 0;
    }

    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, magnitude))
}

fn low_bits(value: &BigUint, mask: u32) -> u8 {
    (value.iter_u32_digits().next().unwrap_or(0) & mask) as u8
}
