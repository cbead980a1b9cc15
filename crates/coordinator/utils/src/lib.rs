//! Wire types and signature checks shared by the multisig coordinator crates.
//!
//! Addresses, keys, signatures and chain ids travel as base58check strings and are embedded in
//! contract values as raw bytes; the types here convert between the two.

mod address;
mod base58;
mod chain_id;
mod error;
mod key;
mod payload;
mod signature;
mod verify;

pub use self::{
    address::Address,
    chain_id::ChainId,
    error::{EncodingError, VerifyError},
    key::{Curve, PubKey},
    payload::{Payload, WATERMARK},
    signature::Signature,
    verify::verify,
};
