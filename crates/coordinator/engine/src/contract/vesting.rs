//! Vesting contracts.
//!
//! ```text
//! parameter (or (option %setDelegate key_hash) (nat %vest));
//! storage (pair (pair %wrapped (address %target) (address %delegateAdmin))
//!               (pair (nat %vested)
//!                     (pair %schedule (timestamp %epoch)
//!                                     (pair (nat %secondsPerTick) (nat %tokensPerTick)))));
//! ```

use chrono::{DateTime, Utc};
use tezos_multisig_coordinator_utils::Address;
use tezos_multisig_michelson::{Entrypoints, OpCode, Prim};

use super::{field_value, params::key_hash_option, section, wrong_contract_type};
use crate::error::MultisigEngineErrorKind;

/// Entrypoint changing the delegate of the vested funds.
pub const SET_DELEGATE_ENTRYPOINT: &str = "setDelegate";

/// Entrypoint releasing vested ticks to the target.
pub const VEST_ENTRYPOINT: &str = "vest";

/// Decoded vesting storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingStorage {
    target: Address,
    delegate_admin: Address,
    vested: u64,
    epoch: DateTime<Utc>,
    seconds_per_tick: u64,
    tokens_per_tick: u64,
}

impl VestingStorage {
    /// Reads `value` using the fields annotated in the storage type.
    pub fn from_script(storage_type: &Prim, value: &Prim) -> Result<Self, MultisigEngineErrorKind> {
        let entrypoints = Entrypoints::resolve(section(storage_type));
        let value = section(value);

        let address = |name: &str| {
            field_value(&entrypoints, value, name, OpCode::T_ADDRESS)
                .and_then(|prim| Address::from_prim(&prim).map_err(|_| wrong_contract_type()))
        };
        let nat = |name: &str| {
            field_value(&entrypoints, value, name, OpCode::T_NAT)?
                .as_u64()
                .ok_or_else(wrong_contract_type)
        };

        let epoch = field_value(&entrypoints, value, "epoch", OpCode::T_TIMESTAMP)?;

        Ok(Self {
            target: address("target")?,
            delegate_admin: address("delegateadmin")?,
            vested: nat("vested")?,
            epoch: timestamp(&epoch).ok_or_else(wrong_contract_type)?,
            seconds_per_tick: nat("secondspertick")?,
            tokens_per_tick: nat("tokenspertick")?,
        })
    }

    /// Returns the account receiving vested tokens.
    pub fn target(&self) -> &Address {
        &self.target
    }

    /// Returns the account allowed to change the delegate.
    pub fn delegate_admin(&self) -> &Address {
        &self.delegate_admin
    }

    /// Returns the number of ticks already vested.
    pub fn vested(&self) -> u64 {
        self.vested
    }

    /// Returns the start of the schedule.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Returns the tick length in seconds.
    pub fn seconds_per_tick(&self) -> u64 {
        self.seconds_per_tick
    }

    /// Returns the mutez released per tick.
    pub fn tokens_per_tick(&self) -> u64 {
        self.tokens_per_tick
    }
}

// timestamps come back either as unix seconds or as RFC 3339 text
fn timestamp(prim: &Prim) -> Option<DateTime<Utc>> {
    match prim {
        Prim::Int(_) => DateTime::from_timestamp(prim.as_i64()?, 0),
        Prim::String(text) => DateTime::parse_from_rfc3339(text).ok().map(|time| time.with_timezone(&Utc)),
        _ => None,
    }
}

/// Origination storage of a vesting contract, nothing vested yet.
pub fn build_vesting_storage(
    target: &Address,
    delegate_admin: &Address,
    epoch: DateTime<Utc>,
    seconds_per_tick: u64,
    tokens_per_tick: u64,
) -> Prim {
    Prim::pair(
        Prim::pair(Prim::bytes(target.to_bytes()), Prim::bytes(delegate_admin.to_bytes())),
        Prim::pair(
            Prim::int(0),
            Prim::pair(
                Prim::int(epoch.timestamp()),
                Prim::pair(Prim::int(seconds_per_tick), Prim::int(tokens_per_tick)),
            ),
        ),
    )
}

/// A direct call to a vesting contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VestingCall {
    /// Sets the delegate, `None` to withdraw.
    SetDelegate(Option<Address>),
    /// Vests the given number of ticks.
    Vest(u64),
}

/// Returns the entrypoint and argument of `call`.
pub fn build_vesting_call(call: &VestingCall) -> Result<(&'static str, Prim), MultisigEngineErrorKind> {
    match call {
        VestingCall::SetDelegate(delegate) => {
            Ok((SET_DELEGATE_ENTRYPOINT, key_hash_option(delegate.as_ref(), "delegate")?))
        },
        VestingCall::Vest(0) => Err(MultisigEngineErrorKind::bad_param("ticks")),
        VestingCall::Vest(ticks) => Ok((VEST_ENTRYPOINT, Prim::int(*ticks))),
    }
}
