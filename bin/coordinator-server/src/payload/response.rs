use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tezos_multisig_coordinator_utils::{Address, Payload, PubKey};
use tezos_multisig_michelson::Prim;

use crate::payload::RequestPayload;

#[derive(Debug, Builder, Serialize)]
pub struct ContractStorageResponsePayload {
    storage: Prim,
}

#[derive(Debug, Builder, Serialize)]
pub struct ContractInfoResponsePayload {
    balance: u64,
    counter: u64,
    threshold: u64,
    keys: Vec<PubKey>,
}

#[derive(Debug, Builder, Serialize)]
pub struct ProposeOperationResponsePayload {
    operation: RequestPayload,
    created: bool,
}

#[derive(Debug, Builder, Serialize)]
pub struct SignPayloadResponsePayload {
    request_hash: String,
    payload: Payload,
}

#[derive(Debug, Builder, Serialize)]
pub struct AddSignatureResponsePayload {
    signature_count: u64,
    threshold: u64,
}

#[derive(Debug, Builder, Serialize)]
pub struct ContractCallResponsePayload {
    entrypoint: &'static str,
    value: Prim,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListOperationsResponsePayload {
    operations: Vec<RequestPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct SyncContractResponsePayload {
    processed: usize,
    last_level: u64,
}

#[derive(Debug, Builder, Serialize)]
pub struct VestingInfoResponsePayload {
    target: Address,
    delegate_admin: Address,
    vested: u64,
    epoch: DateTime<Utc>,
    seconds_per_tick: u64,
    tokens_per_tick: u64,
}

// pools exceed the JSON number range
#[derive(Debug, Builder, Serialize)]
pub struct DexterPoolsResponsePayload {
    token_pool: String,
    xtz_pool: String,
}
