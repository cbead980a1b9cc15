use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tezos_multisig_coordinator_domain::{
    Contract, Request, RequestSignature, RequestStatus, SignatureType, Timestamps,
};
use tezos_multisig_coordinator_store::{MultisigRepository, MultisigStoreError, ProposedRequest};
use tezos_multisig_coordinator_utils::{Address, Signature};

type Result<T> = core::result::Result<T, MultisigStoreError>;

/// A [`MultisigRepository`] kept in memory, with the nonce allocation rules of the database
/// store.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    contracts: Vec<(Address, u64, DateTime<Utc>)>,
    requests: Vec<(Request<()>, DateTime<Utc>)>,
    signatures: Vec<(RequestSignature<()>, DateTime<Utc>)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }
}

impl StoreState {
    fn contract(&mut self, address: &Address) -> Contract {
        if !self.contracts.iter().any(|(known, ..)| known == address) {
            self.contracts.push((*address, 0, Utc::now()));
        }

        self.contracts
            .iter()
            .find(|(known, ..)| known == address)
            .map(|&(address, last_level, created_at)| {
                Contract::builder().address(address).last_level(last_level).aux(stamps(created_at)).build()
            })
            .unwrap()
    }

    fn find_request(&self, hash: &str) -> Option<Request> {
        self.requests
            .iter()
            .find(|(request, _)| request.hash() == hash)
            .map(|(request, created_at)| with_stamps(request, *created_at))
    }
}

fn stamps(created_at: DateTime<Utc>) -> Timestamps {
    Timestamps::builder().created_at(created_at).updated_at(Utc::now()).build()
}

fn with_stamps(request: &Request<()>, created_at: DateTime<Utc>) -> Request<Timestamps> {
    request.clone().with_aux(stamps(created_at)).0
}

fn with_status(request: &Request<()>, status: RequestStatus, operation_hash: Option<&str>) -> Request<()> {
    Request::builder()
        .hash(request.hash().to_string())
        .contract(*request.contract())
        .network(*request.network())
        .maybe_counter(request.counter())
        .status(status)
        .action(request.action().clone())
        .maybe_operation_hash(operation_hash.or(request.operation_hash()).map(str::to_string))
        .aux(())
        .build()
}

#[async_trait]
impl MultisigRepository for InMemoryStore {
    async fn get_or_create_contract(&self, address: &Address) -> Result<Contract> {
        Ok(self.state().contract(address))
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>> {
        Ok(self
            .state()
            .contracts
            .iter()
            .map(|&(address, last_level, created_at)| {
                Contract::builder().address(address).last_level(last_level).aux(stamps(created_at)).build()
            })
            .collect())
    }

    async fn update_contract_last_level(&self, address: &Address, last_level: u64) -> Result<()> {
        let mut state = self.state();

        let (_, level, _) = state
            .contracts
            .iter_mut()
            .find(|(known, ..)| known == address)
            .ok_or(MultisigStoreError::NotFound("contract not found".into()))?;
        *level = last_level;

        Ok(())
    }

    async fn propose_request(
        &self,
        contract: &Address,
        on_chain_counter: u64,
        build: &(dyn Fn(u64) -> Request<()> + Send + Sync),
    ) -> Result<ProposedRequest> {
        let mut state = self.state();
        state.contract(contract);

        let mut pending: Vec<_> = state
            .requests
            .iter()
            .filter(|(request, _)| {
                request.contract() == contract
                    && request.status() == RequestStatus::Pending
                    && request.counter().is_some_and(|counter| counter >= on_chain_counter)
            })
            .collect();
        pending.sort_by_key(|(request, _)| request.counter());

        let mut nonce = on_chain_counter;

        for (request, created_at) in pending {
            let Some(counter) = request.counter() else { continue };

            if build(counter).hash() == request.hash() {
                let request = with_stamps(request, *created_at);
                return Ok(ProposedRequest::builder().request(request).created(false).build());
            }

            nonce = nonce.max(counter + 1);
        }

        let request = build(nonce);

        if let Some(existing) = state.find_request(request.hash()) {
            return Ok(ProposedRequest::builder().request(existing).created(false).build());
        }

        let created_at = Utc::now();
        state.requests.push((request.clone(), created_at));

        Ok(ProposedRequest::builder().request(with_stamps(&request, created_at)).created(true).build())
    }

    async fn get_request_by_hash(&self, hash: &str) -> Result<Option<Request>> {
        Ok(self.state().find_request(hash))
    }

    async fn get_request_by_counter(&self, contract: &Address, counter: u64) -> Result<Option<Request>> {
        let state = self.state();

        let mut matching: Vec<_> = state
            .requests
            .iter()
            .filter(|(request, _)| request.contract() == contract && request.counter() == Some(counter))
            .collect();
        matching.sort_by_key(|(request, created_at)| (request.status() == RequestStatus::Pending, *created_at));

        Ok(matching.last().map(|(request, created_at)| with_stamps(request, *created_at)))
    }

    async fn list_requests(
        &self,
        contract: &Address,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Request>> {
        Ok(self
            .state()
            .requests
            .iter()
            .rev()
            .filter(|(request, _)| {
                request.contract() == contract && status.is_none_or(|status| request.status() == status)
            })
            .map(|(request, created_at)| with_stamps(request, *created_at))
            .collect())
    }

    async fn save_observed_request(&self, request: Request<()>) -> Result<bool> {
        let mut state = self.state();

        if state.requests.iter().any(|(known, _)| known.hash() == request.hash()) {
            return Ok(false);
        }

        state.requests.push((request, Utc::now()));

        Ok(true)
    }

    async fn update_request_status(
        &self,
        hash: &str,
        status: RequestStatus,
        operation_hash: Option<&str>,
    ) -> Result<bool> {
        let mut state = self.state();

        let Some((request, _)) = state.requests.iter_mut().find(|(request, _)| request.hash() == hash)
        else {
            return Ok(false);
        };

        *request = with_status(request, status, operation_hash);

        Ok(true)
    }

    async fn save_signature(&self, signature: RequestSignature<()>) -> Result<bool> {
        let mut state = self.state();

        let taken = state.signatures.iter().any(|(known, _)| {
            known.signature() == signature.signature()
                || (known.request_hash() == signature.request_hash()
                    && known.kind() == signature.kind()
                    && known.index() == signature.index())
        });

        if taken {
            return Ok(false);
        }

        state.signatures.push((signature, Utc::now()));

        Ok(true)
    }

    async fn get_signature_by_value(&self, signature: &Signature) -> Result<Option<RequestSignature>> {
        Ok(self
            .state()
            .signatures
            .iter()
            .find(|(known, _)| known.signature() == signature)
            .map(|(known, created_at)| known.clone().with_aux(stamps(*created_at)).0))
    }

    async fn get_signatures_by_request(
        &self,
        hash: &str,
        kind: SignatureType,
    ) -> Result<Vec<RequestSignature>> {
        let mut signatures: Vec<_> = self
            .state()
            .signatures
            .iter()
            .filter(|(known, _)| known.request_hash() == hash && known.kind() == kind)
            .map(|(known, created_at)| known.clone().with_aux(stamps(*created_at)).0)
            .collect();
        signatures.sort_by_key(RequestSignature::index);

        Ok(signatures)
    }
}
