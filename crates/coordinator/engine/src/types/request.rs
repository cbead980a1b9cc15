//! Request types for multisig engine operations.

mod error;

pub use self::error::{ContractStorageRequestError, RequestError, VestingStorageRequestError};

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use tezos_multisig_coordinator_domain::{Action, RequestStatus, SignatureType};
use tezos_multisig_coordinator_utils::{Address, Payload, PubKey, Signature};

use crate::contract::params::MAX_KEYS;

/// Request to build the origination storage of a new multisig.
///
/// # Validation
///
/// The request validates that:
/// - `addresses` is non-empty and holds at most twenty owners
/// - `threshold` is between one and the number of owners
#[derive(Debug, Dissolve)]
pub struct BuildContractStorageRequest {
    /// Minimum number of signatures a call needs
    threshold: u64,

    /// Implicit accounts of the owners, in slot order
    addresses: Vec<Address>,
}

/// Request to propose a new owner set for an existing multisig.
///
/// Validated like [`BuildContractStorageRequest`].
#[derive(Debug, Dissolve)]
pub struct UpdateContractStorageRequest {
    /// The multisig to update
    contract: Address,

    /// New signature threshold
    threshold: u64,

    /// Implicit accounts of the new owners, in slot order
    addresses: Vec<Address>,
}

/// Request to propose an action for owners to sign.
#[derive(Debug, Builder, Dissolve)]
pub struct ProposeOperationRequest {
    /// The multisig that executes the action
    contract: Address,

    /// The action and its parameters
    action: Action,
}

/// Request to fetch the bytes an owner signs.
#[derive(Debug, Builder, Dissolve)]
pub struct GetSignPayloadRequest {
    /// Content address of the request
    request_hash: String,

    /// Whether to sign the action or its rejection
    kind: SignatureType,
}

/// Request to record an owner's signature.
#[derive(Debug, Builder, Dissolve)]
pub struct AddSignatureRequest {
    /// Content address of the request
    request_hash: String,

    /// Key of the signing owner
    pub_key: PubKey,

    /// The payload the owner signed, checked against the one the engine derives
    payload: Option<Payload>,

    /// The signature
    signature: Signature,

    /// The lane the signature counts towards
    kind: SignatureType,
}

/// Request to assemble the `main_parameter` call of a request.
#[derive(Debug, Builder, Dissolve)]
pub struct BuildFinalCallRequest {
    /// Content address of the request
    request_hash: String,

    /// Which lane's signatures to use
    kind: SignatureType,
}

/// Request to list the requests of a multisig.
#[derive(Debug, Builder, Dissolve)]
pub struct ListOperationsRequest {
    /// The multisig to query
    contract: Address,

    /// Optional status filter
    status: Option<RequestStatus>,
}

/// Request to build the origination storage of a vesting contract.
///
/// # Validation
///
/// Both tick parameters must be non-zero.
#[derive(Debug, Dissolve)]
pub struct BuildVestingStorageRequest {
    /// Receiver of vested tokens
    target: Address,

    /// Account allowed to change the delegate
    delegate_admin: Address,

    /// Start of the schedule
    epoch: DateTime<Utc>,

    /// Tick length in seconds
    seconds_per_tick: u64,

    /// Mutez released per tick
    tokens_per_tick: u64,
}

#[bon::bon]
impl BuildContractStorageRequest {
    /// Creates a new storage request with validation.
    ///
    /// # Parameters
    ///
    /// * `threshold` - Number of signatures required (must not exceed the number of addresses)
    /// * `addresses` - Owner accounts, whose revealed keys become the owner keys
    ///
    /// Returns an error if validation fails.
    #[builder]
    pub fn new(threshold: u64, addresses: Vec<Address>) -> Result<Self, ContractStorageRequestError> {
        validate_owner_set(threshold, &addresses)?;

        Ok(Self { threshold, addresses })
    }
}

#[bon::bon]
impl UpdateContractStorageRequest {
    /// Creates a new storage update request with validation.
    #[builder]
    pub fn new(
        contract: Address,
        threshold: u64,
        addresses: Vec<Address>,
    ) -> Result<Self, ContractStorageRequestError> {
        validate_owner_set(threshold, &addresses)?;

        Ok(Self { contract, threshold, addresses })
    }
}

#[bon::bon]
impl BuildVestingStorageRequest {
    /// Creates a new vesting storage request with validation.
    #[builder]
    pub fn new(
        target: Address,
        delegate_admin: Address,
        epoch: DateTime<Utc>,
        seconds_per_tick: u64,
        tokens_per_tick: u64,
    ) -> Result<Self, VestingStorageRequestError> {
        if seconds_per_tick == 0 {
            return Err(VestingStorageRequestError::ZeroSecondsPerTick);
        }

        if tokens_per_tick == 0 {
            return Err(VestingStorageRequestError::ZeroTokensPerTick);
        }

        Ok(Self { target, delegate_admin, epoch, seconds_per_tick, tokens_per_tick })
    }
}

fn validate_owner_set(threshold: u64, addresses: &[Address]) -> Result<(), ContractStorageRequestError> {
    if addresses.is_empty() {
        return Err(ContractStorageRequestError::EmptyAddresses);
    }

    if addresses.len() > MAX_KEYS {
        return Err(ContractStorageRequestError::TooManyAddresses(MAX_KEYS));
    }

    if threshold == 0 {
        return Err(ContractStorageRequestError::ZeroThreshold);
    }

    let owners = u64::try_from(addresses.len())
        .map_err(|e| ContractStorageRequestError::other(e.to_string()))?;

    if threshold > owners {
        return Err(ContractStorageRequestError::ExcessThreshold);
    }

    Ok(())
}
