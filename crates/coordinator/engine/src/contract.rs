//! Encoders and decoders for the contracts the coordinator talks to.

pub mod asset;
pub mod dexter;
pub mod params;
pub mod path;
pub mod payload;
pub mod storage;
pub mod vesting;

use tezos_multisig_michelson::{Entrypoints, OpCode, Prim, select};

use crate::error::MultisigEngineErrorKind;

/// Strips the `parameter` or `storage` keyword wrapping a script section, if present.
pub(crate) fn section(prim: &Prim) -> &Prim {
    match prim.arg(0) {
        Some(inner) if prim.is(OpCode::K_PARAMETER) || prim.is(OpCode::K_STORAGE) => inner,
        _ => prim,
    }
}

/// Reads the value of a typed field, failing when the value tree does not follow the type.
pub(crate) fn field_value(
    entrypoints: &Entrypoints<'_>,
    value: &Prim,
    name: &str,
    expected: OpCode,
) -> Result<Prim, MultisigEngineErrorKind> {
    let field = entrypoints.field(name, expected)?;

    select(value, field.branch()).ok_or_else(wrong_contract_type)
}

pub(crate) fn wrong_contract_type() -> MultisigEngineErrorKind {
    MultisigEngineErrorKind::bad_param("wrong contract type")
}
