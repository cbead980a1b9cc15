pub mod request;
pub mod response;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::DisplayFromStr;
use tezos_multisig_coordinator_domain::{
    Action, Request, RequestStatus, request::RequestDissolved,
};
use tezos_multisig_coordinator_utils::{Address, ChainId};

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct RequestPayload {
    hash: String,
    contract: Address,
    network: ChainId,

    #[serde(skip_serializing_if = "Option::is_none")]
    counter: Option<u64>,

    #[serde_as(as = "DisplayFromStr")]
    status: RequestStatus,

    action: Action,

    #[serde(skip_serializing_if = "Option::is_none")]
    operation_hash: Option<String>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Request> for RequestPayload {
    fn from(request: Request) -> Self {
        let RequestDissolved {
            hash,
            contract,
            network,
            counter,
            status,
            action,
            operation_hash,
            aux,
        } = request.dissolve();

        Self::builder()
            .hash(hash)
            .contract(contract)
            .network(network)
            .maybe_counter(counter)
            .status(status)
            .action(action)
            .maybe_operation_hash(operation_hash)
            .created_at(aux.created_at())
            .updated_at(aux.updated_at())
            .build()
    }
}
