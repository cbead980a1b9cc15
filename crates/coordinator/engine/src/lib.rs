//! The quorum engine of the multisig coordinator.
//!
//! [`MultisigEngine`] turns proposed actions into nonce-bound payloads, collects owner
//! signatures for them, assembles the final `main_parameter` call, and follows the chain to
//! settle requests once their call (or its rejection) is executed. Chain reads go through a
//! [`ChainClient`], persistence through a [`MultisigRepository`].

mod chain;
pub mod contract;
mod error;
mod types;

pub use self::{
    chain::{ChainClient, ChainError, ContractScript, ObservedOperation},
    error::{ErrorCode, MultisigEngineError, MultisigEngineErrorKind, Result},
    types::{request, response},
};

use std::collections::{HashMap, hash_map::Entry};

use blake2::{Blake2b, Digest, digest::consts::U32};
use tezos_multisig_coordinator_domain::{
    Action, Request, RequestSignature, RequestStatus, SignatureType, TransferUnit,
};
use tezos_multisig_coordinator_store::MultisigRepository;
use tezos_multisig_coordinator_utils::{Address, ChainId, Payload, PubKey, verify};
use tezos_multisig_michelson::Prim;

use self::{
    contract::{
        asset::{AssetKind, TRANSFER_ENTRYPOINT, parse_asset_transfer},
        dexter::DexterPools,
        params::validate_action,
        payload::{MAIN_ENTRYPOINT, MainCall, action_arm, final_call, reject_arm, sign_payload},
        storage::{ContractStorageContainer, build_contract_storage},
        vesting::{VestingCall, VestingStorage, build_vesting_call, build_vesting_storage},
    },
    types::{
        request::{
            AddSignatureRequest, AddSignatureRequestDissolved, BuildContractStorageRequest,
            BuildContractStorageRequestDissolved, BuildFinalCallRequest,
            BuildFinalCallRequestDissolved, BuildVestingStorageRequest,
            BuildVestingStorageRequestDissolved, GetSignPayloadRequest,
            GetSignPayloadRequestDissolved, ListOperationsRequest, ListOperationsRequestDissolved,
            ProposeOperationRequest, ProposeOperationRequestDissolved, UpdateContractStorageRequest,
            UpdateContractStorageRequestDissolved,
        },
        response::{
            AddSignatureResponse, ContractCallResponse, ContractInfoResponse,
            ListOperationsResponse, ProposeOperationResponse, SignPayloadResponse,
            SyncContractResponse,
        },
    },
};

/// Coordinates proposals, signatures and chain synchronization for multisig contracts.
pub struct MultisigEngine<S, C> {
    store: S,
    chain: C,
}

impl<S, C> MultisigEngine<S, C> {
    pub fn new(store: S, chain: C) -> Self {
        Self { store, chain }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }
}

impl<S, C> MultisigEngine<S, C>
where
    S: MultisigRepository,
    C: ChainClient,
{
    /// Builds the origination storage of a multisig owned by `addresses`.
    ///
    /// Every owner must have revealed its public key.
    #[tracing::instrument(skip_all)]
    pub async fn build_contract_storage(
        &self,
        request: BuildContractStorageRequest,
    ) -> Result<Prim> {
        let BuildContractStorageRequestDissolved { threshold, addresses } = request.dissolve();

        let keys = self.owner_keys(&addresses).await?;

        Ok(build_contract_storage(threshold, &keys))
    }

    /// Resolves the revealed public key of each implicit account.
    #[tracing::instrument(skip_all, fields(count = addresses.len()))]
    pub async fn owner_keys(&self, addresses: &[Address]) -> Result<Vec<PubKey>> {
        let mut keys = Vec::with_capacity(addresses.len());

        for address in addresses {
            if address.is_originated() {
                return Err(MultisigEngineErrorKind::bad_param("address").into());
            }

            let key = self
                .chain
                .manager_key(address)
                .await
                .map_err(MultisigEngineErrorKind::from)?
                .ok_or_else(|| {
                    tracing::warn!(%address, "owner has no revealed key");
                    MultisigEngineErrorKind::bad_param("address")
                })?;

            keys.push(key);
        }

        Ok(keys)
    }

    /// Proposes replacing the owner set of a multisig.
    pub async fn propose_storage_update(
        &self,
        request: UpdateContractStorageRequest,
    ) -> Result<ProposeOperationResponse> {
        let UpdateContractStorageRequestDissolved { contract, threshold, addresses } =
            request.dissolve();

        let keys = self.owner_keys(&addresses).await?;

        let request = ProposeOperationRequest::builder()
            .contract(contract)
            .action(Action::StorageUpdate { threshold, keys })
            .build();

        self.propose_operation(request).await
    }

    /// Stores a pending request for `action` at the next free nonce.
    ///
    /// Proposing an action that is already pending returns the existing request.
    #[tracing::instrument(skip_all, fields(contract, kind))]
    pub async fn propose_operation(
        &self,
        request: ProposeOperationRequest,
    ) -> Result<ProposeOperationResponse> {
        let ProposeOperationRequestDissolved { contract, action } = request.dissolve();

        let span = tracing::Span::current();
        span.record("contract", tracing::field::display(&contract));
        span.record("kind", tracing::field::display(action.kind()));

        validate_action(&action)?;
        let arm = action_arm(&action, &contract)?;

        let network = self.chain.chain_id().await.map_err(MultisigEngineErrorKind::from)?;
        let storage = self.contract_storage(&contract).await?;

        let build = |counter: u64| {
            Request::builder()
                .hash(sign_payload(&network, &contract, counter, arm.clone()).hash())
                .contract(contract)
                .network(network)
                .counter(counter)
                .status(RequestStatus::Pending)
                .action(action.clone())
                .aux(())
                .build()
        };

        let proposed = self
            .store
            .propose_request(&contract, storage.counter(), &build)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let (request, created) = (proposed.request().clone(), proposed.created());

        Ok(ProposeOperationResponse::builder().request(request).created(created).build())
    }

    /// Returns the bytes owners sign to approve or reject a pending request.
    #[tracing::instrument(skip_all)]
    pub async fn get_sign_payload(
        &self,
        request: GetSignPayloadRequest,
    ) -> Result<SignPayloadResponse> {
        let GetSignPayloadRequestDissolved { request_hash, kind } = request.dissolve();

        let request = self.pending_request(&request_hash).await?;
        let payload = request_payload(&request, kind)?;

        Ok(SignPayloadResponse::builder().request_hash(request_hash).payload(payload).build())
    }

    /// Verifies and records an owner's signature.
    ///
    /// Submitting a signature twice, or a second signature from the same owner in the same
    /// lane, leaves the stored set unchanged.
    #[tracing::instrument(skip_all, fields(request_hash, kind))]
    pub async fn add_signature(&self, request: AddSignatureRequest) -> Result<AddSignatureResponse> {
        let AddSignatureRequestDissolved { request_hash, pub_key, payload, signature, kind } =
            request.dissolve();

        let span = tracing::Span::current();
        span.record("request_hash", request_hash.as_str());
        span.record("kind", tracing::field::display(kind));

        let request = self.pending_request(&request_hash).await?;
        let storage = self.contract_storage(request.contract()).await?;

        let index = storage.contains(&pub_key).ok_or_else(|| {
            tracing::warn!(%pub_key, "signer is not an owner");
            MultisigEngineErrorKind::not_allowed("pub_key")
        })?;

        let expected = request_payload(&request, kind)?;

        if payload.is_some_and(|payload| payload != expected) {
            return Err(MultisigEngineErrorKind::bad_param("payload").into());
        }

        verify(expected.as_bytes(), &signature, &pub_key)
            .map_err(|_| MultisigEngineErrorKind::bad_param("signature"))?;

        let existing = self
            .store
            .get_signature_by_value(&signature)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        if let Some(existing) = existing
            && existing.request_hash() != request.hash()
        {
            return Err(MultisigEngineErrorKind::already_exists("signature").into());
        }

        let mut signatures = self
            .store
            .get_signatures_by_request(request.hash(), kind)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        if signatures.iter().any(|stored| stored.index() == index) {
            tracing::debug!(index, "owner already signed");
        } else {
            let new_signature = RequestSignature::builder()
                .request_hash(request_hash)
                .index(index)
                .signature(signature)
                .kind(kind)
                .aux(())
                .build();

            // a concurrent call may fill the slot first; the store keeps one signature per slot
            let saved = self
                .store
                .save_signature(new_signature)
                .await
                .map_err(MultisigEngineErrorKind::from)?;

            if !saved {
                tracing::debug!(index, "slot filled concurrently");
            }

            signatures = self
                .store
                .get_signatures_by_request(request.hash(), kind)
                .await
                .map_err(MultisigEngineErrorKind::from)?;
        }

        let signature_count = u64::try_from(signatures.len())
            .map_err(|e| MultisigEngineErrorKind::other(e.to_string()))?;

        Ok(AddSignatureResponse::builder()
            .signature_count(signature_count)
            .threshold(storage.threshold())
            .build())
    }

    /// Assembles the `main_parameter` call from the signatures of one lane.
    ///
    /// The call is built whatever the number of signatures; the contract enforces its threshold.
    #[tracing::instrument(skip_all)]
    pub async fn build_final_call(
        &self,
        request: BuildFinalCallRequest,
    ) -> Result<ContractCallResponse> {
        let BuildFinalCallRequestDissolved { request_hash, kind } = request.dissolve();

        let request = self.pending_request(&request_hash).await?;
        let storage = self.contract_storage(request.contract()).await?;
        let payload = request_payload(&request, kind)?;

        let signatures = self
            .store
            .get_signatures_by_request(request.hash(), kind)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let mut slots = vec![None; storage.keys().len()];

        for stored in signatures {
            let index = stored.index();

            let Some((slot, key)) = usize::try_from(index)
                .ok()
                .and_then(|index| slots.get_mut(index).zip(storage.keys().get(index)))
            else {
                tracing::warn!(index, "signature slot is outside the current owner set");
                continue;
            };

            if verify(payload.as_bytes(), stored.signature(), key).is_err() {
                tracing::warn!(index, "stored signature does not match the current owner key");
                continue;
            }

            *slot = Some(*stored.signature());
        }

        let value = final_call(&payload, &slots)?;

        Ok(ContractCallResponse::builder().entrypoint(MAIN_ENTRYPOINT).value(value).build())
    }

    pub async fn list_operations(
        &self,
        request: ListOperationsRequest,
    ) -> Result<ListOperationsResponse> {
        let ListOperationsRequestDissolved { contract, status } = request.dissolve();

        self.store
            .list_requests(&contract, status)
            .await
            .map(|requests| ListOperationsResponse::builder().requests(requests).build())
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    /// Settles requests and records income from operations observed since the last sync.
    #[tracing::instrument(skip_all, fields(%contract))]
    pub async fn sync_contract_operations(&self, contract: &Address) -> Result<SyncContractResponse> {
        let tracked = self
            .store
            .get_or_create_contract(contract)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let operations = self
            .chain
            .contract_operations(contract, tracked.last_level())
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let Some(last_level) = operations.iter().map(ObservedOperation::level).max() else {
            return Ok(SyncContractResponse::builder()
                .processed(0)
                .last_level(tracked.last_level())
                .build());
        };

        let network = self.chain.chain_id().await.map_err(MultisigEngineErrorKind::from)?;

        let mut assets = HashMap::new();
        let mut positions = HashMap::<&str, usize>::new();
        let mut processed = 0;

        for operation in &operations {
            let position = positions.entry(operation.hash()).or_default();
            let hash = observed_hash(operation.hash(), *position);
            *position += 1;

            if !operation.applied() {
                continue;
            }

            let changed = if operation.target() == contract {
                self.sync_own_operation(contract, network, operation, hash).await?
            } else {
                self.sync_asset_transfer(contract, network, operation, hash, &mut assets).await?
            };

            if changed {
                processed += 1;
            }
        }

        let last_level = last_level.max(tracked.last_level());

        self.store
            .update_contract_last_level(contract, last_level)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        tracing::info!(processed, last_level, "contract synchronized");

        Ok(SyncContractResponse::builder().processed(processed).last_level(last_level).build())
    }

    /// Synchronizes every tracked contract, logging and skipping the ones that fail.
    #[tracing::instrument(skip_all)]
    pub async fn sync_all_contracts(&self) -> Result<usize> {
        let contracts = self.store.list_contracts().await.map_err(MultisigEngineErrorKind::from)?;

        let mut processed = 0;

        for contract in contracts {
            match self.sync_contract_operations(contract.address()).await {
                Ok(response) => processed += response.dissolve().processed,
                Err(err) => {
                    tracing::error!(contract = %contract.address(), %err, "contract sync failed");
                },
            }
        }

        Ok(processed)
    }

    /// Reads the counter, threshold and owner keys of a multisig.
    pub async fn contract_storage(&self, contract: &Address) -> Result<ContractStorageContainer> {
        let script =
            self.chain.contract_script(contract).await.map_err(MultisigEngineErrorKind::from)?;
        let value =
            self.chain.contract_storage(contract).await.map_err(MultisigEngineErrorKind::from)?;

        ContractStorageContainer::from_script(script.storage(), &value).map_err(From::from)
    }

    #[tracing::instrument(skip_all, fields(%contract))]
    pub async fn contract_info(&self, contract: &Address) -> Result<ContractInfoResponse> {
        let storage = self.contract_storage(contract).await?;
        let balance = self.chain.balance(contract).await.map_err(MultisigEngineErrorKind::from)?;

        Ok(ContractInfoResponse::builder()
            .balance(balance)
            .counter(storage.counter())
            .threshold(storage.threshold())
            .keys(storage.keys().to_vec())
            .build())
    }

    #[tracing::instrument(skip_all, fields(%contract))]
    pub async fn vesting_storage(&self, contract: &Address) -> Result<VestingStorage> {
        let script =
            self.chain.contract_script(contract).await.map_err(MultisigEngineErrorKind::from)?;
        let value =
            self.chain.contract_storage(contract).await.map_err(MultisigEngineErrorKind::from)?;

        VestingStorage::from_script(script.storage(), &value).map_err(From::from)
    }

    #[tracing::instrument(skip_all, fields(%contract))]
    pub async fn dexter_pools(&self, contract: &Address) -> Result<DexterPools> {
        let script =
            self.chain.contract_script(contract).await.map_err(MultisigEngineErrorKind::from)?;
        let value =
            self.chain.contract_storage(contract).await.map_err(MultisigEngineErrorKind::from)?;

        DexterPools::from_script(script.storage(), &value).map_err(From::from)
    }

    pub fn build_vesting_storage(&self, request: BuildVestingStorageRequest) -> Prim {
        let BuildVestingStorageRequestDissolved {
            target,
            delegate_admin,
            epoch,
            seconds_per_tick,
            tokens_per_tick,
        } = request.dissolve();

        build_vesting_storage(&target, &delegate_admin, epoch, seconds_per_tick, tokens_per_tick)
    }

    pub fn build_vesting_call(&self, call: &VestingCall) -> Result<ContractCallResponse> {
        let (entrypoint, value) = build_vesting_call(call)?;

        Ok(ContractCallResponse::builder().entrypoint(entrypoint).value(value).build())
    }

    async fn pending_request(&self, hash: &str) -> Result<Request, MultisigEngineErrorKind> {
        let request = self
            .store
            .get_request_by_hash(hash)
            .await?
            .ok_or_else(|| MultisigEngineErrorKind::not_found("operation"))?;

        if request.status() != RequestStatus::Pending {
            return Err(MultisigEngineErrorKind::not_allowed("operation"));
        }

        Ok(request)
    }

    async fn sync_own_operation(
        &self,
        contract: &Address,
        network: ChainId,
        operation: &ObservedOperation,
        hash: String,
    ) -> Result<bool, MultisigEngineErrorKind> {
        match (operation.entrypoint(), operation.parameters()) {
            (Some(MAIN_ENTRYPOINT), Some(value)) => self.settle_request(contract, operation, value).await,
            (None | Some("default"), _) if operation.amount() > 0 => {
                let action =
                    Action::IncomeTransfer { from: *operation.sender(), amount: operation.amount() };

                self.save_income(contract, network, operation, hash, action).await
            },
            _ => Ok(false),
        }
    }

    async fn settle_request(
        &self,
        contract: &Address,
        operation: &ObservedOperation,
        value: &Prim,
    ) -> Result<bool, MultisigEngineErrorKind> {
        let Some(call) = MainCall::parse(value) else {
            tracing::warn!(operation = operation.hash(), "unreadable main_parameter call");
            return Ok(false);
        };

        let Some(request) = self.store.get_request_by_counter(contract, call.counter()).await? else {
            tracing::warn!(counter = call.counter(), "no request for executed counter");
            return Ok(false);
        };

        if request.status() != RequestStatus::Pending {
            return Ok(false);
        }

        let status = if call.is_reject() {
            RequestStatus::Rejected
        } else {
            match action_arm(request.action(), contract) {
                Ok(arm) if &arm == call.arm() => RequestStatus::Approved,
                _ => {
                    tracing::warn!(
                        counter = call.counter(),
                        request = request.hash(),
                        "executed call differs from the proposed action"
                    );
                    RequestStatus::Rejected
                },
            }
        };

        let updated = self
            .store
            .update_request_status(request.hash(), status, Some(operation.hash()))
            .await?;

        tracing::info!(request = request.hash(), %status, "request settled");

        Ok(updated)
    }

    async fn sync_asset_transfer(
        &self,
        contract: &Address,
        network: ChainId,
        operation: &ObservedOperation,
        hash: String,
        assets: &mut HashMap<Address, Option<AssetKind>>,
    ) -> Result<bool, MultisigEngineErrorKind> {
        let (Some(TRANSFER_ENTRYPOINT), Some(value)) = (operation.entrypoint(), operation.parameters())
        else {
            return Ok(false);
        };

        let asset = *operation.target();

        let kind = match assets.entry(asset) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let script = self.chain.contract_script(&asset).await?;
                *entry.insert(AssetKind::detect(script.parameter()).ok())
            },
        };

        let Some(kind) = kind else {
            return Ok(false);
        };

        let units = match parse_asset_transfer(kind, value) {
            Ok(units) => units,
            Err(err) => {
                tracing::warn!(operation = operation.hash(), %asset, %err, "unreadable token transfer");
                return Ok(false);
            },
        };

        let mut incoming = units
            .iter()
            .filter_map(|unit| {
                let txs: Vec<_> = unit.txs().iter().filter(|tx| tx.to() == contract).cloned().collect();

                (!txs.is_empty())
                    .then(|| TransferUnit::builder().maybe_from(unit.from().copied()).txs(txs).build())
            })
            .collect::<Vec<_>>();

        let action = match kind {
            AssetKind::Fa12 if !incoming.is_empty() => {
                Action::IncomeFa12Transfer { asset, transfer_unit: incoming.remove(0) }
            },
            AssetKind::Fa2 if !incoming.is_empty() => {
                Action::IncomeFa2Transfer { asset, transfer_units: incoming }
            },
            _ => return Ok(false),
        };

        self.save_income(contract, network, operation, hash, action).await
    }

    async fn save_income(
        &self,
        contract: &Address,
        network: ChainId,
        operation: &ObservedOperation,
        hash: String,
        action: Action,
    ) -> Result<bool, MultisigEngineErrorKind> {
        let request = Request::builder()
            .hash(hash)
            .contract(*contract)
            .network(network)
            .status(RequestStatus::Success)
            .action(action)
            .operation_hash(operation.hash().to_string())
            .aux(())
            .build();

        self.store.save_observed_request(request).await.map_err(From::from)
    }
}

/// Re-derives the payload of one lane of a request from its stored nonce and action.
fn request_payload<AUX>(
    request: &Request<AUX>,
    kind: SignatureType,
) -> Result<Payload, MultisigEngineErrorKind> {
    let counter = request.counter().ok_or_else(|| MultisigEngineErrorKind::not_allowed("operation"))?;

    let arm = match kind {
        SignatureType::Approve => action_arm(request.action(), request.contract())?,
        SignatureType::Reject => reject_arm(),
    };

    Ok(sign_payload(request.network(), request.contract(), counter, arm))
}

// content address of an observed operation; `position` orders the transactions of one group
fn observed_hash(operation_hash: &str, position: usize) -> String {
    let digest = Blake2b::<U32>::new()
        .chain_update(operation_hash.as_bytes())
        .chain_update(position.to_be_bytes())
        .finalize();

    const_hex::encode(digest)
}
