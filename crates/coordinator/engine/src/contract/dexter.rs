//! Liquidity pools of a Dexter exchange contract.

use num_bigint::BigInt;
use tezos_multisig_michelson::{Entrypoints, OpCode, Prim};

use super::{field_value, section, wrong_contract_type};
use crate::error::MultisigEngineErrorKind;

/// Token and tez reserves of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexterPools {
    token_pool: BigInt,
    xtz_pool: BigInt,
}

impl DexterPools {
    /// Reads `%tokenPool` and `%xtzPool`, accepting either spelling of the annotations.
    pub fn from_script(storage_type: &Prim, value: &Prim) -> Result<Self, MultisigEngineErrorKind> {
        let entrypoints = Entrypoints::resolve(section(storage_type));
        let value = section(value);

        Ok(Self {
            token_pool: pool(&entrypoints, value, "tokenpool", OpCode::T_NAT)?,
            xtz_pool: pool(&entrypoints, value, "xtzpool", OpCode::T_MUTEZ)?,
        })
    }

    /// Returns the token reserve.
    pub fn token_pool(&self) -> &BigInt {
        &self.token_pool
    }

    /// Returns the tez reserve in mutez.
    pub fn xtz_pool(&self) -> &BigInt {
        &self.xtz_pool
    }
}

fn pool(
    entrypoints: &Entrypoints<'_>,
    value: &Prim,
    name: &str,
    expected: OpCode,
) -> Result<BigInt, MultisigEngineErrorKind> {
    field_value(entrypoints, value, name, expected)?.as_int().cloned().ok_or_else(wrong_contract_type)
}
