//! Response types for multisig engine operations.

use dissolve_derive::Dissolve;
use tezos_multisig_coordinator_domain::Request;
use tezos_multisig_coordinator_utils::{Payload, PubKey};
use tezos_multisig_michelson::Prim;

/// Response from proposing an operation.
#[derive(Debug, Dissolve)]
pub struct ProposeOperationResponse {
    /// The new request, or the existing one carrying the same payload
    request: Request,

    /// `false` when an existing request was returned
    created: bool,
}

/// Response from fetching a sign payload.
#[derive(Debug, Dissolve)]
pub struct SignPayloadResponse {
    /// Content address of the request
    request_hash: String,

    /// Watermarked bytes to sign
    payload: Payload,
}

/// Response from recording a signature.
#[derive(Debug, Dissolve)]
pub struct AddSignatureResponse {
    /// Number of distinct signatures recorded in the lane
    signature_count: u64,

    /// Signatures the contract requires
    threshold: u64,
}

/// A ready-to-inject contract call.
#[derive(Debug, Dissolve)]
pub struct ContractCallResponse {
    /// Entrypoint to call
    entrypoint: &'static str,

    /// Call argument
    value: Prim,
}

/// Response from listing requests.
#[derive(Debug, Dissolve)]
pub struct ListOperationsResponse {
    /// Requests matching the query, newest first
    requests: Vec<Request>,
}

/// Response from synchronizing a multisig with the chain.
#[derive(Debug, Dissolve)]
pub struct SyncContractResponse {
    /// Observed operations that changed or created a request
    processed: usize,

    /// Highest block level processed so far
    last_level: u64,
}

/// On-chain state of a multisig.
#[derive(Debug, Dissolve)]
pub struct ContractInfoResponse {
    /// Balance in mutez
    balance: u64,

    /// Next counter the contract accepts
    counter: u64,

    /// Signatures a call needs
    threshold: u64,

    /// Owner keys in slot order
    keys: Vec<PubKey>,
}

#[bon::bon]
impl ProposeOperationResponse {
    #[builder]
    pub(crate) fn new(request: Request, created: bool) -> Self {
        Self { request, created }
    }
}

#[bon::bon]
impl SignPayloadResponse {
    #[builder]
    pub(crate) fn new(request_hash: String, payload: Payload) -> Self {
        Self { request_hash, payload }
    }
}

#[bon::bon]
impl AddSignatureResponse {
    #[builder]
    pub(crate) fn new(signature_count: u64, threshold: u64) -> Self {
        Self { signature_count, threshold }
    }
}

#[bon::bon]
impl ContractCallResponse {
    #[builder]
    pub(crate) fn new(entrypoint: &'static str, value: Prim) -> Self {
        Self { entrypoint, value }
    }
}

#[bon::bon]
impl ListOperationsResponse {
    #[builder]
    pub(crate) fn new(requests: Vec<Request>) -> Self {
        Self { requests }
    }
}

#[bon::bon]
impl SyncContractResponse {
    #[builder]
    pub(crate) fn new(processed: usize, last_level: u64) -> Self {
        Self { processed, last_level }
    }
}

#[bon::bon]
impl ContractInfoResponse {
    #[builder]
    pub(crate) fn new(balance: u64, counter: u64, threshold: u64, keys: Vec<PubKey>) -> Self {
        Self { balance, counter, threshold, keys }
    }
}
