//! Token standard detection and decoding of observed `transfer` calls.

use strum::{Display, EnumString, IntoStaticStr};
use tezos_multisig_coordinator_domain::{TransferUnit, Tx};
use tezos_multisig_coordinator_utils::Address;
use tezos_multisig_michelson::{
    Direction::{self, Left as L, Right as R},
    Entrypoints, OpCode, Prim, select,
};

use super::section;
use crate::error::MultisigEngineErrorKind;

/// Entrypoint both token standards expose for moving tokens.
pub const TRANSFER_ENTRYPOINT: &str = "transfer";

const FA2_FIELDS: &[(&str, OpCode)] = &[
    ("transfer", OpCode::T_LIST),
    ("from", OpCode::T_ADDRESS),
    ("txs", OpCode::T_LIST),
    ("to", OpCode::T_ADDRESS),
    ("tokenid", OpCode::T_NAT),
    ("amount", OpCode::T_NAT),
];

const FA12_FIELDS: &[(&str, OpCode)] = &[
    ("transfer", OpCode::T_PAIR),
    ("from", OpCode::T_ADDRESS),
    ("to", OpCode::T_ADDRESS),
    ("value", OpCode::T_NAT),
];

/// Token standard of an asset contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    /// Single-asset ledger, TZIP-7.
    Fa12,
    /// Multi-asset ledger, TZIP-12.
    Fa2,
}

impl AssetKind {
    /// Recognizes the standard from the annotated `transfer` entrypoint of a parameter type.
    ///
    /// FA2 is tried first since its field names are a superset of FA1.2's.
    pub fn detect(parameter_type: &Prim) -> Result<Self, MultisigEngineErrorKind> {
        let entrypoints = Entrypoints::resolve(section(parameter_type));

        if entrypoints.require(FA2_FIELDS).is_ok() {
            return Ok(Self::Fa2);
        }

        entrypoints.require(FA12_FIELDS)?;

        Ok(Self::Fa12)
    }
}

/// Reads the transfers out of a `transfer` call argument.
///
/// Addresses may be encoded as bytes or strings.
pub fn parse_asset_transfer(
    kind: AssetKind,
    value: &Prim,
) -> Result<Vec<TransferUnit>, MultisigEngineErrorKind> {
    match kind {
        AssetKind::Fa12 => {
            let tx = Tx::builder().to(address_at(value, &[R, L])?).amount(nat_at(value, &[R, R])?).build();

            Ok(vec![TransferUnit::builder().from(address_at(value, &[L])?).txs(vec![tx]).build()])
        },
        AssetKind::Fa2 => value.as_seq().ok_or_else(malformed)?.iter().map(parse_fa2_unit).collect(),
    }
}

fn parse_fa2_unit(unit: &Prim) -> Result<TransferUnit, MultisigEngineErrorKind> {
    let txs = select(unit, &[R])
        .ok_or_else(malformed)?
        .as_seq()
        .ok_or_else(malformed)?
        .iter()
        .map(|tx| {
            Ok(Tx::builder()
                .to(address_at(tx, &[L])?)
                .token_id(nat_at(tx, &[R, L])?)
                .amount(nat_at(tx, &[R, R])?)
                .build())
        })
        .collect::<Result<_, MultisigEngineErrorKind>>()?;

    Ok(TransferUnit::builder().from(address_at(unit, &[L])?).txs(txs).build())
}

fn address_at(value: &Prim, path: &[Direction]) -> Result<Address, MultisigEngineErrorKind> {
    select(value, path)
        .and_then(|prim| Address::from_prim(&prim).ok())
        .ok_or_else(malformed)
}

fn nat_at(value: &Prim, path: &[Direction]) -> Result<u64, MultisigEngineErrorKind> {
    select(value, path).and_then(|prim| prim.as_u64()).ok_or_else(malformed)
}

fn malformed() -> MultisigEngineErrorKind {
    MultisigEngineErrorKind::bad_param("parameters")
}
