use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use serde::Deserialize;
use serde_with::DisplayFromStr;
use tezos_multisig_coordinator_domain::{Action, SignatureType};

#[derive(Debug, Dissolve, Deserialize)]
pub struct InitContractStorageRequestPayload {
    threshold: u64,
    addresses: Vec<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UpdateContractStorageRequestPayload {
    contract: String,
    threshold: u64,
    addresses: Vec<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ContractRequestPayload {
    contract: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ProposeOperationRequestPayload {
    contract: String,
    action: Action,
}

#[serde_with::serde_as]
#[derive(Debug, Dissolve, Deserialize)]
pub struct OperationRequestPayload {
    request_hash: String,

    #[serde_as(as = "DisplayFromStr")]
    kind: SignatureType,
}

#[serde_with::serde_as]
#[derive(Debug, Dissolve, Deserialize)]
pub struct AddSignatureRequestPayload {
    request_hash: String,
    pub_key: String,
    payload: Option<String>,
    signature: String,

    #[serde_as(as = "DisplayFromStr")]
    kind: SignatureType,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ListOperationsRequestPayload {
    contract: String,
    status: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct InitVestingStorageRequestPayload {
    target: String,
    delegate_admin: String,
    epoch: DateTime<Utc>,
    seconds_per_tick: u64,
    tokens_per_tick: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum VestingCallRequestPayload {
    SetDelegate { delegate: Option<String> },
    Vest { ticks: u64 },
}
