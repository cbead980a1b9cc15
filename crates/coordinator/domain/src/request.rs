//! Multisig requests and the signatures collected for them.

use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};
use tezos_multisig_coordinator_utils::{Address, ChainId, Signature};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Action, Timestamps};

/// The lifecycle status of a [`Request`].
///
/// Proposed requests start `Pending` and become `Approved` or `Rejected` once the matching
/// contract call is seen on chain. Observed income is recorded directly as `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum RequestStatus {
    /// Waiting for signatures or for execution.
    Pending,
    /// Executed with the approve arm.
    Approved,
    /// Executed with the reject arm.
    Rejected,
    /// Observed incoming operation.
    Success,
}

/// The lane a signature counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SignatureType {
    /// Signs the requested action.
    Approve,
    /// Signs the no-op that burns the request's nonce.
    Reject,
}

/// A proposed or observed contract operation.
///
/// # Type Parameters
///
/// * `AUX` - Auxiliary data type, defaults to [`Timestamps`] for tracking metadata.
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Request<AUX = Timestamps> {
    /// Content address of the signable payload, or of the operation for observed income.
    hash: String,

    /// The multisig contract.
    contract: Address,

    /// The network the payload is bound to.
    network: ChainId,

    /// The contract nonce the payload is bound to; absent for observed income.
    counter: Option<u64>,

    /// Current status.
    status: RequestStatus,

    /// The action and its parameters.
    action: Action,

    /// Hash of the on-chain operation that settled the request.
    operation_hash: Option<String>,

    /// Auxiliary metadata associated with this request.
    aux: AUX,
}

impl<AUX> Request<AUX> {
    /// Returns the content address.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns the multisig contract.
    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// Returns the network.
    pub fn network(&self) -> &ChainId {
        &self.network
    }

    /// Returns the nonce.
    pub fn counter(&self) -> Option<u64> {
        self.counter
    }

    /// Returns the status.
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the action.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Returns the settling operation hash.
    pub fn operation_hash(&self) -> Option<&str> {
        self.operation_hash.as_deref()
    }

    /// Returns the auxiliary data.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }

    /// Replaces the auxiliary data, returning the request with the new data and the old data.
    pub fn with_aux<AUX2>(self, aux: AUX2) -> (Request<AUX2>, AUX) {
        let RequestDissolved { hash, contract, network, counter, status, action, operation_hash, aux: old } =
            self.dissolve();

        let request = Request { hash, contract, network, counter, status, action, operation_hash, aux };

        (request, old)
    }
}

/// A signature collected for a [`Request`].
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RequestSignature<AUX = Timestamps> {
    /// Content address of the signed request.
    request_hash: String,

    /// Slot of the signer in the contract's key list at signing time.
    index: u32,

    /// The signature.
    signature: Signature,

    /// The lane this signature counts towards.
    kind: SignatureType,

    /// Auxiliary metadata associated with this signature.
    aux: AUX,
}

impl<AUX> RequestSignature<AUX> {
    /// Returns the content address of the signed request.
    pub fn request_hash(&self) -> &str {
        &self.request_hash
    }

    /// Returns the signer slot.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the lane.
    pub fn kind(&self) -> SignatureType {
        self.kind
    }

    /// Returns the auxiliary data.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }

    /// Replaces the auxiliary data, returning the signature with the new data and the old data.
    pub fn with_aux<AUX2>(self, aux: AUX2) -> (RequestSignature<AUX2>, AUX) {
        let RequestSignatureDissolved { request_hash, index, signature, kind, aux: old } = self.dissolve();

        (RequestSignature { request_hash, index, signature, kind, aux }, old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Success,
        ] {
            assert_eq!(status.to_string().parse::<RequestStatus>().unwrap(), status);
        }

        assert_eq!(<&str>::from(SignatureType::Reject), "reject");
    }

    #[test]
    fn with_aux_swaps_metadata() {
        let request = Request::builder()
            .hash("abc".to_string())
            .contract("KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV".parse().unwrap())
            .network("NetXjD3HPJJjmcd".parse().unwrap())
            .counter(3)
            .status(RequestStatus::Pending)
            .action(Action::Delegation { to: None })
            .aux(())
            .build();

        let (request, ()) = request.with_aux(7u8);

        assert_eq!(*request.aux(), 7);
        assert_eq!(request.counter(), Some(3));
        assert_eq!(request.operation_hash(), None);
    }
}
