//! Multisig contracts known to the coordinator.

use bon::Builder;
use dissolve_derive::Dissolve;
use tezos_multisig_coordinator_utils::Address;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Timestamps;

/// A multisig contract tracked by the coordinator.
///
/// # Type Parameters
///
/// * `AUX` - Auxiliary data type, defaults to [`Timestamps`] for tracking metadata.
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contract<AUX = Timestamps> {
    /// The contract address.
    address: Address,

    /// The highest block level whose operations have been synchronized.
    #[builder(default)]
    last_level: u64,

    /// Auxiliary metadata associated with this contract.
    aux: AUX,
}

impl<AUX> Contract<AUX> {
    /// Returns the contract address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the last synchronized level.
    pub fn last_level(&self) -> u64 {
        self.last_level
    }

    /// Returns the auxiliary data.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }
}
