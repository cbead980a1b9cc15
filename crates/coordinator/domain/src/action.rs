//! Contract actions a multisig request can carry.

use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};
use tezos_multisig_coordinator_utils::{Address, PubKey};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum ActionType {
    /// Tez transfer out of the contract.
    Transfer,
    /// Delegate change of the contract.
    Delegation,
    /// FA1.2 token transfer out of the contract.
    Fa12Transfer,
    /// FA2 token transfer out of the contract.
    Fa2Transfer,
    /// Threshold and owner key replacement.
    StorageUpdate,
    /// Arbitrary lambda executed by the contract.
    CustomPayload,
    /// `vest` call on a vesting contract.
    VestingVest,
    /// `setDelegate` call on a vesting contract.
    VestingSetDelegate,
    /// Tez received by the contract.
    IncomeTransfer,
    /// FA1.2 tokens received by the contract.
    IncomeFa12Transfer,
    /// FA2 tokens received by the contract.
    IncomeFa2Transfer,
}

impl ActionType {
    /// Returns `true` for actions observed on chain rather than proposed by owners.
    pub fn is_income(self) -> bool {
        matches!(self, Self::IncomeTransfer | Self::IncomeFa12Transfer | Self::IncomeFa2Transfer)
    }
}

/// One token transfer inside a [`TransferUnit`].
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tx {
    /// Receiver.
    to: Address,
    /// Token id, always `0` for FA1.2.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    token_id: u64,
    /// Token amount.
    amount: u64,
}

impl Tx {
    /// Returns the receiver.
    pub fn to(&self) -> &Address {
        &self.to
    }

    /// Returns the token id.
    pub fn token_id(&self) -> u64 {
        self.token_id
    }

    /// Returns the token amount.
    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// Token transfers sharing one sender.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransferUnit {
    /// Sender; the multisig contract itself when absent.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    from: Option<Address>,
    /// Transfers from the sender.
    txs: Vec<Tx>,
}

impl TransferUnit {
    /// Returns the explicit sender, if any.
    pub fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    /// Returns the sender, defaulting to `contract`.
    pub fn from_or(&self, contract: &Address) -> Address {
        self.from.unwrap_or(*contract)
    }

    /// Returns the transfers.
    pub fn txs(&self) -> &[Tx] {
        &self.txs
    }
}

/// An action together with its parameters.
///
/// Income variants describe operations observed on chain; they are recorded but never encoded
/// into a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Action {
    /// Sends tez from the contract.
    Transfer {
        /// Receiver.
        to: Address,
        /// Amount in mutez.
        amount: u64,
    },
    /// Sets or removes the contract's delegate.
    Delegation {
        /// New delegate, `None` to withdraw.
        #[cfg_attr(feature = "serde", serde(default))]
        to: Option<Address>,
    },
    /// Sends FA1.2 tokens.
    Fa12Transfer {
        /// Token contract.
        asset: Address,
        /// The single transfer.
        transfer_unit: TransferUnit,
    },
    /// Sends FA2 tokens.
    Fa2Transfer {
        /// Token contract.
        asset: Address,
        /// Transfers grouped by sender.
        transfer_units: Vec<TransferUnit>,
    },
    /// Replaces the threshold and the owner keys.
    StorageUpdate {
        /// New signature threshold.
        threshold: u64,
        /// New owner keys in slot order.
        keys: Vec<PubKey>,
    },
    /// Runs a caller supplied lambda.
    CustomPayload {
        /// Micheline JSON, or forged hex with an optional watermark.
        payload: String,
    },
    /// Releases vested tokens.
    VestingVest {
        /// Vesting contract.
        vesting_contract: Address,
        /// Ticks to vest.
        ticks: u64,
    },
    /// Sets the delegate of a vesting contract.
    VestingSetDelegate {
        /// Vesting contract.
        vesting_contract: Address,
        /// New delegate, `None` to withdraw.
        #[cfg_attr(feature = "serde", serde(default))]
        delegate: Option<Address>,
    },
    /// Tez received by the contract.
    IncomeTransfer {
        /// Sender.
        from: Address,
        /// Amount in mutez.
        amount: u64,
    },
    /// FA1.2 tokens received by the contract.
    IncomeFa12Transfer {
        /// Token contract.
        asset: Address,
        /// The observed transfer.
        transfer_unit: TransferUnit,
    },
    /// FA2 tokens received by the contract.
    IncomeFa2Transfer {
        /// Token contract.
        asset: Address,
        /// The observed transfers.
        transfer_units: Vec<TransferUnit>,
    },
}

impl Action {
    /// Returns the kind of this action.
    pub fn kind(&self) -> ActionType {
        match self {
            Self::Transfer { .. } => ActionType::Transfer,
            Self::Delegation { .. } => ActionType::Delegation,
            Self::Fa12Transfer { .. } => ActionType::Fa12Transfer,
            Self::Fa2Transfer { .. } => ActionType::Fa2Transfer,
            Self::StorageUpdate { .. } => ActionType::StorageUpdate,
            Self::CustomPayload { .. } => ActionType::CustomPayload,
            Self::VestingVest { .. } => ActionType::VestingVest,
            Self::VestingSetDelegate { .. } => ActionType::VestingSetDelegate,
            Self::IncomeTransfer { .. } => ActionType::IncomeTransfer,
            Self::IncomeFa12Transfer { .. } => ActionType::IncomeFa12Transfer,
            Self::IncomeFa2Transfer { .. } => ActionType::IncomeFa2Transfer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_names() {
        assert_eq!(ActionType::Fa12Transfer.to_string(), "fa12_transfer");
        assert_eq!("vesting_set_delegate".parse::<ActionType>().unwrap(), ActionType::VestingSetDelegate);
        assert!(ActionType::IncomeFa2Transfer.is_income());
        assert!(!ActionType::Transfer.is_income());
    }

    #[test]
    fn transfer_unit_defaults_sender() {
        let contract: Address = "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV".parse().unwrap();
        let to: Address = "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH".parse().unwrap();

        let unit = TransferUnit::builder().txs(vec![Tx::builder().to(to).amount(1).build()]).build();

        assert_eq!(unit.from_or(&contract), contract);
        assert_eq!(unit.txs()[0].token_id(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn actions_serialize_with_type_tag() {
        let action: Action = serde_json::from_str(
            r#"{"type":"transfer","to":"tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH","amount":1010}"#,
        )
        .unwrap();

        assert_eq!(action.kind(), ActionType::Transfer);

        let json = serde_json::to_value(&Action::Delegation { to: None }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "delegation", "to": null }));
    }
}
