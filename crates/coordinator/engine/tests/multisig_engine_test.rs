//! integration tests for tezos-multisig-coordinator-engine

use futures::future::join_all;
use tezos_multisig_coordinator_domain::{
    Action, RequestSignature, RequestStatus, SignatureType, TransferUnit, Tx,
};
use tezos_multisig_coordinator_engine::{
    ErrorCode, MultisigEngine, MultisigEngineError, ObservedOperation,
    contract::{
        payload::{action_arm, final_call, reject_arm, sign_payload},
        storage::build_contract_storage,
    },
    request::{
        AddSignatureRequest, BuildContractStorageRequest, BuildFinalCallRequest,
        GetSignPayloadRequest, ListOperationsRequest, ProposeOperationRequest,
        UpdateContractStorageRequest,
    },
    response::{
        AddSignatureResponseDissolved, ContractCallResponseDissolved,
        ContractInfoResponseDissolved, ProposeOperationResponseDissolved,
        SyncContractResponseDissolved,
    },
};
use tezos_multisig_coordinator_store::MultisigRepository;
use tezos_multisig_coordinator_utils::{Address, ChainId, Payload, PubKey, Signature};
use tezos_multisig_michelson::Prim;
use tezos_multisig_test_utils::{InMemoryStore, MockChain, TestSigner, fixtures};

const NETWORK: &str = "NetXdQprcVkpaWU";
const MULTISIG: &str = "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV";
const FA12_TOKEN: &str = "KT1PWx2mnDueood7fEmfbBDKx1D9BAnnXitn";
const FA2_TOKEN: &str = "KT1RJ6PbjHpwc3M5rw5s2Nbmefwbuwbdxton";
const RECEIVER: &str = "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH";

type Engine = MultisigEngine<InMemoryStore, MockChain>;

struct Setup {
    engine: Engine,
    contract: Address,
    network: ChainId,
    owners: Vec<TestSigner>,
}

impl Setup {
    fn new(threshold: u64) -> Self {
        let network: ChainId = NETWORK.parse().unwrap();
        let contract: Address = MULTISIG.parse().unwrap();
        let owners = vec![TestSigner::ed25519(1), TestSigner::secp256k1(2), TestSigner::p256(3)];

        let chain = MockChain::new(network);
        chain.with_multisig(contract, 0, threshold, &keys(&owners));

        Self { engine: MultisigEngine::new(InMemoryStore::new(), chain), contract, network, owners }
    }

    async fn propose(&self, action: Action) -> (String, bool) {
        let request = ProposeOperationRequest::builder().contract(self.contract).action(action).build();

        let ProposeOperationResponseDissolved { request, created } =
            self.engine.propose_operation(request).await.unwrap().dissolve();

        (request.hash().to_string(), created)
    }

    async fn payload(&self, hash: &str, kind: SignatureType) -> Payload {
        let request = GetSignPayloadRequest::builder().request_hash(hash.to_string()).kind(kind).build();

        self.engine.get_sign_payload(request).await.unwrap().dissolve().payload
    }

    async fn sign(
        &self,
        hash: &str,
        signer: &TestSigner,
        kind: SignatureType,
    ) -> Result<AddSignatureResponseDissolved, MultisigEngineError> {
        let payload = self.payload(hash, kind).await;

        let request = AddSignatureRequest::builder()
            .request_hash(hash.to_string())
            .pub_key(signer.pub_key())
            .payload(payload.clone())
            .signature(signer.sign(payload.as_bytes()))
            .kind(kind)
            .build();

        self.engine.add_signature(request).await.map(|response| response.dissolve())
    }

    async fn final_call(&self, hash: &str, kind: SignatureType) -> Prim {
        let request = BuildFinalCallRequest::builder().request_hash(hash.to_string()).kind(kind).build();

        let ContractCallResponseDissolved { entrypoint, value } =
            self.engine.build_final_call(request).await.unwrap().dissolve();
        assert_eq!(entrypoint, "main_parameter");

        value
    }

    async fn status(&self, hash: &str) -> RequestStatus {
        self.engine.store().get_request_by_hash(hash).await.unwrap().unwrap().status()
    }
}

fn keys(signers: &[TestSigner]) -> Vec<PubKey> {
    signers.iter().map(TestSigner::pub_key).collect()
}

fn transfer(amount: u64) -> Action {
    Action::Transfer { to: RECEIVER.parse().unwrap(), amount }
}

fn call(hash: &str, level: u64, target: Address, entrypoint: Option<&str>, parameters: Option<Prim>) -> ObservedOperation {
    ObservedOperation::builder()
        .hash(hash.to_string())
        .level(level)
        .applied(true)
        .sender(RECEIVER.parse().unwrap())
        .target(target)
        .maybe_entrypoint(entrypoint.map(str::to_string))
        .maybe_parameters(parameters)
        .build()
}

fn assert_error(err: MultisigEngineError, code: ErrorCode, value: &str) {
    assert_eq!(err.code(), code, "{err}");
    assert_eq!(err.value(), Some(value));
}

#[tokio::test]
async fn proposals_are_idempotent_and_take_the_next_free_nonce() {
    let setup = Setup::new(2);

    let (first, created) = setup.propose(transfer(100)).await;
    assert!(created);

    let (again, created) = setup.propose(transfer(100)).await;
    assert!(!created);
    assert_eq!(again, first);

    let (second, created) = setup.propose(transfer(200)).await;
    assert!(created);

    let store = setup.engine.store();
    assert_eq!(store.get_request_by_hash(&first).await.unwrap().unwrap().counter(), Some(0));
    assert_eq!(store.get_request_by_hash(&second).await.unwrap().unwrap().counter(), Some(1));

    setup.engine.chain().set_counter(setup.contract, 5);

    let (third, _) = setup.propose(transfer(300)).await;
    assert_eq!(store.get_request_by_hash(&third).await.unwrap().unwrap().counter(), Some(5));

    let listed = setup
        .engine
        .list_operations(
            ListOperationsRequest::builder().contract(setup.contract).status(RequestStatus::Pending).build(),
        )
        .await
        .unwrap()
        .dissolve()
        .requests;
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].hash(), third);
}

#[tokio::test]
async fn concurrent_proposals_get_distinct_nonces() {
    let setup = Setup::new(2);
    setup.engine.chain().set_counter(setup.contract, 3);

    let proposals = join_all((1..=8).map(|amount| setup.propose(transfer(amount)))).await;
    assert!(proposals.iter().all(|(_, created)| *created));

    let store = setup.engine.store();
    let mut counters = Vec::new();
    for (hash, _) in &proposals {
        counters.push(store.get_request_by_hash(hash).await.unwrap().unwrap().counter().unwrap());
    }
    counters.sort_unstable();

    assert_eq!(counters, (3..11).collect::<Vec<_>>());
}

#[tokio::test]
async fn invalid_actions_are_rejected_before_anything_is_stored() {
    let setup = Setup::new(2);

    let request = ProposeOperationRequest::builder().contract(setup.contract).action(transfer(0)).build();
    assert_error(setup.engine.propose_operation(request).await.unwrap_err(), ErrorCode::BadParam, "amount");

    let income = Action::IncomeTransfer { from: RECEIVER.parse().unwrap(), amount: 1 };
    let request = ProposeOperationRequest::builder().contract(setup.contract).action(income).build();
    assert_error(setup.engine.propose_operation(request).await.unwrap_err(), ErrorCode::BadParam, "type");

    let custom = Action::CustomPayload { payload: "not micheline".to_string() };
    let request = ProposeOperationRequest::builder().contract(setup.contract).action(custom).build();
    assert_error(setup.engine.propose_operation(request).await.unwrap_err(), ErrorCode::BadRequest, "payload");

    let listed = setup
        .engine
        .list_operations(ListOperationsRequest::builder().contract(setup.contract).build())
        .await
        .unwrap()
        .dissolve()
        .requests;
    assert!(listed.is_empty());
}

#[tokio::test]
async fn sign_payloads_are_bound_to_network_contract_and_nonce() {
    let setup = Setup::new(2);
    let action = transfer(100);

    let (hash, _) = setup.propose(action.clone()).await;

    let approve = setup.payload(&hash, SignatureType::Approve).await;
    let expected = sign_payload(&setup.network, &setup.contract, 0, action_arm(&action, &setup.contract).unwrap());
    assert_eq!(approve, expected);
    assert_eq!(approve.hash(), hash);

    let reject = setup.payload(&hash, SignatureType::Reject).await;
    assert_eq!(reject, sign_payload(&setup.network, &setup.contract, 0, reject_arm()));

    let request = GetSignPayloadRequest::builder().request_hash("unknown".to_string()).kind(SignatureType::Approve).build();
    assert_error(setup.engine.get_sign_payload(request).await.unwrap_err(), ErrorCode::NotFound, "operation");
}

#[tokio::test]
async fn signatures_are_checked_and_counted_per_lane() {
    let setup = Setup::new(2);
    let (hash, _) = setup.propose(transfer(100)).await;

    let response = setup.sign(&hash, &setup.owners[0], SignatureType::Approve).await.unwrap();
    assert_eq!((response.signature_count, response.threshold), (1, 2));

    // resubmitting changes nothing
    let response = setup.sign(&hash, &setup.owners[0], SignatureType::Approve).await.unwrap();
    assert_eq!(response.signature_count, 1);

    let outsider = TestSigner::ed25519(9);
    assert_error(
        setup.sign(&hash, &outsider, SignatureType::Approve).await.err().unwrap(),
        ErrorCode::NotAllowed,
        "pub_key",
    );

    let payload = setup.payload(&hash, SignatureType::Approve).await;
    let forged = AddSignatureRequest::builder()
        .request_hash(hash.clone())
        .pub_key(setup.owners[1].pub_key())
        .signature(setup.owners[1].sign(b"something else"))
        .kind(SignatureType::Approve)
        .build();
    assert_error(setup.engine.add_signature(forged).await.unwrap_err(), ErrorCode::BadParam, "signature");

    let reject_payload = setup.payload(&hash, SignatureType::Reject).await;
    let mismatched = AddSignatureRequest::builder()
        .request_hash(hash.clone())
        .pub_key(setup.owners[1].pub_key())
        .payload(reject_payload)
        .signature(setup.owners[1].sign(payload.as_bytes()))
        .kind(SignatureType::Approve)
        .build();
    assert_error(setup.engine.add_signature(mismatched).await.unwrap_err(), ErrorCode::BadParam, "payload");

    let response = setup.sign(&hash, &setup.owners[1], SignatureType::Reject).await.unwrap();
    assert_eq!(response.signature_count, 1);

    let response = setup.sign(&hash, &setup.owners[2], SignatureType::Approve).await.unwrap();
    assert_eq!(response.signature_count, 2);
}

#[tokio::test]
async fn one_signature_per_owner_slot_whatever_the_encoding() {
    let setup = Setup::new(2);
    let (hash, _) = setup.propose(transfer(100)).await;
    let payload = setup.payload(&hash, SignatureType::Approve).await;

    let owner = &setup.owners[0];
    let specific = owner.sign(payload.as_bytes());
    let generic = Signature::new(None, *specific.as_bytes());

    let submit = |signature: Signature| {
        AddSignatureRequest::builder()
            .request_hash(hash.clone())
            .pub_key(owner.pub_key())
            .signature(signature)
            .kind(SignatureType::Approve)
            .build()
    };

    let (first, second) = tokio::join!(
        setup.engine.add_signature(submit(specific)),
        setup.engine.add_signature(submit(generic)),
    );
    assert_eq!(first.unwrap().dissolve().signature_count, 1);
    assert_eq!(second.unwrap().dissolve().signature_count, 1);

    // the store itself refuses a second signature in a filled slot
    let store = setup.engine.store();
    let slot_taken = RequestSignature::builder()
        .request_hash(hash.clone())
        .index(0)
        .signature(setup.owners[1].sign(payload.as_bytes()))
        .kind(SignatureType::Approve)
        .aux(())
        .build();
    assert!(!store.save_signature(slot_taken).await.unwrap());

    let other_lane = RequestSignature::builder()
        .request_hash(hash.clone())
        .index(0)
        .signature(owner.sign(setup.payload(&hash, SignatureType::Reject).await.as_bytes()))
        .kind(SignatureType::Reject)
        .aux(())
        .build();
    assert!(store.save_signature(other_lane).await.unwrap());

    let approvals = store.get_signatures_by_request(&hash, SignatureType::Approve).await.unwrap();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0].index(), 0);
}

#[tokio::test]
async fn final_call_places_signatures_in_owner_slots() {
    let setup = Setup::new(2);
    let (hash, _) = setup.propose(transfer(100)).await;

    let empty = setup.final_call(&hash, SignatureType::Approve).await;
    let payload = setup.payload(&hash, SignatureType::Approve).await;
    assert_eq!(empty, final_call(&payload, &[None, None, None]).unwrap());

    setup.sign(&hash, &setup.owners[2], SignatureType::Approve).await.unwrap();
    setup.sign(&hash, &setup.owners[0], SignatureType::Approve).await.unwrap();

    let value = setup.final_call(&hash, SignatureType::Approve).await;

    // RFC 6979 makes the ECDSA signatures as deterministic as the Ed25519 one
    let expected = final_call(
        &payload,
        &[
            Some(setup.owners[0].sign(payload.as_bytes())),
            None,
            Some(setup.owners[2].sign(payload.as_bytes())),
        ],
    )
    .unwrap();
    assert_eq!(value, expected);
}

#[tokio::test]
async fn executed_calls_settle_their_requests() {
    let setup = Setup::new(1);

    let (approved, _) = setup.propose(transfer(100)).await;
    let (rejected, _) = setup.propose(transfer(200)).await;

    setup.sign(&approved, &setup.owners[0], SignatureType::Approve).await.unwrap();
    setup.sign(&rejected, &setup.owners[1], SignatureType::Reject).await.unwrap();

    let approve_call = setup.final_call(&approved, SignatureType::Approve).await;
    let reject_call = setup.final_call(&rejected, SignatureType::Reject).await;

    let chain = setup.engine.chain();
    chain.push_operation(setup.contract, call("opApprove", 10, setup.contract, Some("main_parameter"), Some(approve_call)));
    chain.push_operation(setup.contract, call("opReject", 11, setup.contract, Some("main_parameter"), Some(reject_call)));

    let SyncContractResponseDissolved { processed, last_level } =
        setup.engine.sync_contract_operations(&setup.contract).await.unwrap().dissolve();
    assert_eq!((processed, last_level), (2, 11));

    assert_eq!(setup.status(&approved).await, RequestStatus::Approved);
    assert_eq!(setup.status(&rejected).await, RequestStatus::Rejected);

    let settled = setup.engine.store().get_request_by_hash(&approved).await.unwrap().unwrap();
    assert_eq!(settled.operation_hash(), Some("opApprove"));

    // settled requests no longer accept signatures
    let request = GetSignPayloadRequest::builder().request_hash(approved).kind(SignatureType::Approve).build();
    assert_error(setup.engine.get_sign_payload(request).await.unwrap_err(), ErrorCode::NotAllowed, "operation");

    let again = setup.engine.sync_contract_operations(&setup.contract).await.unwrap().dissolve();
    assert_eq!((again.processed, again.last_level), (0, 11));
}

#[tokio::test]
async fn a_different_call_at_the_same_nonce_rejects_the_request() {
    let setup = Setup::new(1);
    let (hash, _) = setup.propose(transfer(100)).await;

    let other = sign_payload(&setup.network, &setup.contract, 0, action_arm(&transfer(999), &setup.contract).unwrap());
    let value = final_call(&other, &[None, None, None]).unwrap();

    setup.engine.chain().push_operation(setup.contract, call("opOther", 3, setup.contract, Some("main_parameter"), Some(value)));

    setup.engine.sync_contract_operations(&setup.contract).await.unwrap();

    assert_eq!(setup.status(&hash).await, RequestStatus::Rejected);
}

#[tokio::test]
async fn incoming_tez_is_recorded_once() {
    let setup = Setup::new(2);
    let chain = setup.engine.chain();

    let deposit = ObservedOperation::builder()
        .hash("opDeposit".to_string())
        .level(7)
        .applied(true)
        .amount(1_000)
        .sender(RECEIVER.parse().unwrap())
        .target(setup.contract)
        .build();
    let failed = ObservedOperation::builder()
        .hash("opFailed".to_string())
        .level(8)
        .applied(false)
        .amount(5)
        .sender(RECEIVER.parse().unwrap())
        .target(setup.contract)
        .build();

    chain.push_operation(setup.contract, deposit);
    chain.push_operation(setup.contract, failed);

    let response = setup.engine.sync_contract_operations(&setup.contract).await.unwrap().dissolve();
    assert_eq!((response.processed, response.last_level), (1, 8));

    let requests = setup.engine.store().list_requests(&setup.contract, Some(RequestStatus::Success)).await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].counter(), None);
    assert_eq!(requests[0].operation_hash(), Some("opDeposit"));
    assert_eq!(requests[0].action(), &Action::IncomeTransfer { from: RECEIVER.parse().unwrap(), amount: 1_000 });

    // the indexer reporting the operation again does not duplicate it
    setup.engine.store().update_contract_last_level(&setup.contract, 0).await.unwrap();
    let response = setup.engine.sync_contract_operations(&setup.contract).await.unwrap().dissolve();
    assert_eq!(response.processed, 0);
}

#[tokio::test]
async fn incoming_tokens_are_recorded_per_standard() {
    let setup = Setup::new(2);
    let chain = setup.engine.chain();

    let fa12: Address = FA12_TOKEN.parse().unwrap();
    let fa2: Address = FA2_TOKEN.parse().unwrap();
    let sender: Address = RECEIVER.parse().unwrap();

    chain.set_script(
        fa12,
        tezos_multisig_coordinator_engine::ContractScript::builder()
            .parameter(fixtures::fa12_parameter_type())
            .storage(fixtures::unit_type())
            .build(),
    );
    chain.set_script(
        fa2,
        tezos_multisig_coordinator_engine::ContractScript::builder()
            .parameter(fixtures::fa2_parameter_type())
            .storage(fixtures::unit_type())
            .build(),
    );

    let fa12_value = Prim::pair(Prim::string(RECEIVER), Prim::pair(Prim::string(MULTISIG), Prim::int(25)));
    let fa2_value = Prim::Seq(vec![Prim::pair(
        Prim::bytes(sender.to_bytes()),
        Prim::Seq(vec![
            Prim::pair(Prim::bytes(setup.contract.to_bytes()), Prim::pair(Prim::int(3), Prim::int(40))),
            Prim::pair(Prim::bytes(sender.to_bytes()), Prim::pair(Prim::int(3), Prim::int(60))),
        ]),
    )]);

    chain.push_operation(setup.contract, call("opFa12", 20, fa12, Some("transfer"), Some(fa12_value)));
    chain.push_operation(setup.contract, call("opFa2", 21, fa2, Some("transfer"), Some(fa2_value)));

    let response = setup.engine.sync_contract_operations(&setup.contract).await.unwrap().dissolve();
    assert_eq!(response.processed, 2);

    let mut requests = setup.engine.store().list_requests(&setup.contract, None).await.unwrap();
    requests.reverse();

    assert_eq!(
        requests[0].action(),
        &Action::IncomeFa12Transfer {
            asset: fa12,
            transfer_unit: TransferUnit::builder()
                .from(sender)
                .txs(vec![Tx::builder().to(setup.contract).amount(25).build()])
                .build(),
        }
    );
    assert_eq!(
        requests[1].action(),
        &Action::IncomeFa2Transfer {
            asset: fa2,
            transfer_units: vec![
                TransferUnit::builder()
                    .from(sender)
                    .txs(vec![Tx::builder().to(setup.contract).token_id(3).amount(40).build()])
                    .build()
            ],
        }
    );
}

#[tokio::test]
async fn owner_keys_must_be_revealed() {
    let setup = Setup::new(2);

    let addresses: Vec<_> = setup.owners.iter().map(TestSigner::address).collect();
    let request = BuildContractStorageRequest::builder().threshold(2).addresses(addresses.clone()).build().unwrap();

    let storage = setup.engine.build_contract_storage(request).await.unwrap();
    assert_eq!(storage, build_contract_storage(2, &keys(&setup.owners)));

    let unrevealed = TestSigner::ed25519(7).address();
    let request =
        BuildContractStorageRequest::builder().threshold(1).addresses(vec![unrevealed]).build().unwrap();
    assert_error(setup.engine.build_contract_storage(request).await.unwrap_err(), ErrorCode::BadParam, "address");

    let request =
        BuildContractStorageRequest::builder().threshold(1).addresses(vec![setup.contract]).build().unwrap();
    assert_error(setup.engine.build_contract_storage(request).await.unwrap_err(), ErrorCode::BadParam, "address");

    let update = UpdateContractStorageRequest::builder()
        .contract(setup.contract)
        .threshold(1)
        .addresses(addresses[..2].to_vec())
        .build()
        .unwrap();
    let request = setup.engine.propose_storage_update(update).await.unwrap().dissolve().request;
    assert_eq!(
        request.action(),
        &Action::StorageUpdate { threshold: 1, keys: keys(&setup.owners[..2]) }
    );
}

#[tokio::test]
async fn contract_info_reads_the_chain() {
    let setup = Setup::new(2);
    setup.engine.chain().set_balance(setup.contract, 42);

    let ContractInfoResponseDissolved { balance, counter, threshold, keys: owners } =
        setup.engine.contract_info(&setup.contract).await.unwrap().dissolve();

    assert_eq!((balance, counter, threshold), (42, 0, 2));
    assert_eq!(owners, keys(&setup.owners));
}

#[tokio::test]
async fn every_tracked_contract_is_synchronized() {
    let setup = Setup::new(2);

    setup.engine.store().get_or_create_contract(&setup.contract).await.unwrap();
    setup.engine.chain().push_operation(
        setup.contract,
        ObservedOperation::builder()
            .hash("opDeposit".to_string())
            .level(4)
            .applied(true)
            .amount(10)
            .sender(RECEIVER.parse().unwrap())
            .target(setup.contract)
            .build(),
    );

    assert_eq!(setup.engine.sync_all_contracts().await.unwrap(), 1);
    assert_eq!(setup.engine.sync_all_contracts().await.unwrap(), 0);
}
