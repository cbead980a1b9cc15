//! Micheline trees and their encodings.
//!
//! [`Prim`] is the node type shared by contract code, types and values. It can be read and
//! written as forged binary ([`Prim::to_bytes`]), as the indexer's compact binary
//! ([`encode_compact`]) and as JSON ([`Prim::to_json`]). [`Entrypoints`] locates annotated
//! fields inside a type tree and [`select`] reads the matching node out of a value tree.

mod compact;
mod entrypoint;
mod error;
mod forge;
mod json;
mod opcode;
mod path;
mod prim;
mod reader;

pub use compact::{decode_compact, encode_compact};
pub use entrypoint::{Direction, Entrypoint, EntrypointError, Entrypoints};
pub use error::{MichelsonError, Result};
pub use opcode::OpCode;
pub use path::select;
pub use prim::Prim;
