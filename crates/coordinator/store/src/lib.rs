//! Persistence layer for the multisig coordinator.
//!
//! This crate provides storage and retrieval of the contracts the coordinator tracks, the
//! requests proposed against them and the signatures collected for those requests. It acts as
//! the data access layer for the engine.
//!
//! # Architecture
//!
//! The engine talks to storage through the [`MultisigRepository`] trait. [`MultisigStore`] is
//! the PostgreSQL implementation, built on top of [diesel](diesel.rs) with async support:
//! - Connection pooling via [deadpool](docs.rs/deadpool) for efficient resource management
//! - Transaction support for atomic nonce allocation
//! - Type-safe database queries and conversions
//!
//! # Usage
//!
//! ```ignore
//! let pool = establish_pool(database_url, max_connections).await?;
//! let store = MultisigStore::new(pool);
//!
//! let contract = store.get_or_create_contract(&address).await?;
//! let pending = store.list_requests(&address, Some(RequestStatus::Pending)).await?;
//! ```

mod error;
mod persistence;

pub use self::{
    error::MultisigStoreError,
    persistence::pool::{DbConn, DbPool, establish_pool},
};

use async_trait::async_trait;
use bon::Builder;
use diesel_async::AsyncConnection;
use dissolve_derive::Dissolve;
use futures::{StreamExt, TryStreamExt};
use tezos_multisig_coordinator_domain::{
    Action, Contract, Request, RequestSignature, RequestStatus, SignatureType, Timestamps,
};
use tezos_multisig_coordinator_utils::{Address, Signature};

use self::{
    error::Result,
    persistence::{
        record::{
            insert::{NewContractRecord, NewRequestRecord, NewSignatureRecord},
            select::{
                ContractRecord, ContractRecordDissolved, RequestRecord, RequestRecordDissolved,
                SignatureRecord, SignatureRecordDissolved,
            },
        },
        store,
    },
};

/// Outcome of [`MultisigRepository::propose_request`].
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct ProposedRequest {
    /// The stored request.
    request: Request,

    /// `false` when an identical request already existed.
    created: bool,
}

impl ProposedRequest {
    /// Returns the stored request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns whether the request was inserted by this call.
    pub fn created(&self) -> bool {
        self.created
    }
}

/// Storage operations the engine depends on.
#[async_trait]
pub trait MultisigRepository: Send + Sync {
    /// Returns the tracked contract, registering it first if it is unknown.
    async fn get_or_create_contract(&self, address: &Address) -> Result<Contract>;

    /// Returns every tracked contract.
    async fn list_contracts(&self) -> Result<Vec<Contract>>;

    /// Records the highest block level whose operations have been synchronized.
    async fn update_contract_last_level(&self, address: &Address, last_level: u64) -> Result<()>;

    /// Allocates a nonce and stores a pending request atomically.
    ///
    /// `build` produces the request for a candidate nonce. Pending requests at or above
    /// `on_chain_counter` are examined first: when one of them has the hash `build` yields at
    /// that request's own nonce, it is returned unchanged. Otherwise the nonce is the larger of
    /// `on_chain_counter` and one past the highest pending nonce.
    async fn propose_request(
        &self,
        contract: &Address,
        on_chain_counter: u64,
        build: &(dyn Fn(u64) -> Request<()> + Send + Sync),
    ) -> Result<ProposedRequest>;

    /// Looks a request up by its content address.
    async fn get_request_by_hash(&self, hash: &str) -> Result<Option<Request>>;

    /// Looks a request up by the nonce it is bound to, preferring a pending one.
    async fn get_request_by_counter(
        &self,
        contract: &Address,
        counter: u64,
    ) -> Result<Option<Request>>;

    /// Returns the requests of a contract, newest first.
    async fn list_requests(
        &self,
        contract: &Address,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Request>>;

    /// Stores a request observed on chain, returning `false` when it is already known.
    async fn save_observed_request(&self, request: Request<()>) -> Result<bool>;

    /// Moves a request to `status`, returning `false` when the hash is unknown.
    async fn update_request_status(
        &self,
        hash: &str,
        status: RequestStatus,
        operation_hash: Option<&str>,
    ) -> Result<bool>;

    /// Stores a signature unless the same value is already stored or the signer's slot in that
    /// lane of the request is already filled.
    ///
    /// Returns `false` when nothing was inserted.
    async fn save_signature(&self, signature: RequestSignature<()>) -> Result<bool>;

    /// Looks a signature up by its value.
    async fn get_signature_by_value(
        &self,
        signature: &Signature,
    ) -> Result<Option<RequestSignature>>;

    /// Returns the signatures of one lane of a request, ordered by signer slot.
    async fn get_signatures_by_request(
        &self,
        hash: &str,
        kind: SignatureType,
    ) -> Result<Vec<RequestSignature>>;
}

/// The PostgreSQL implementation of [`MultisigRepository`].
pub struct MultisigStore {
    pool: DbPool,
}

impl MultisigStore {
    /// Creates a new `MultisigStore` instance with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        MultisigStore { pool }
    }

    async fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().await.map_err(|_| MultisigStoreError::Pool)
    }
}

#[async_trait]
impl MultisigRepository for MultisigStore {
    #[tracing::instrument(skip_all, fields(%address))]
    async fn get_or_create_contract(&self, address: &Address) -> Result<Contract> {
        let conn = &mut self.get_conn().await?;
        let address = address.to_string();

        let new_contract = NewContractRecord::builder().address(&address).build();
        store::save_new_contract_if_absent(conn, new_contract).await?;

        store::fetch_contract_by_address(conn, &address)
            .await?
            .map(make_contract)
            .ok_or(MultisigStoreError::NotFound("contract vanished after insert".into()))?
    }

    #[tracing::instrument(skip_all)]
    async fn list_contracts(&self) -> Result<Vec<Contract>> {
        store::stream_contracts(&mut self.get_conn().await?)
            .await?
            .map_ok(make_contract)
            .map_err(From::from)
            .map(Result::flatten)
            .try_collect()
            .await
    }

    #[tracing::instrument(skip_all, fields(%address, last_level))]
    async fn update_contract_last_level(&self, address: &Address, last_level: u64) -> Result<()> {
        let conn = &mut self.get_conn().await?;

        if !store::update_last_level_by_contract_address(
            conn,
            &address.to_string(),
            to_signed(last_level)?,
        )
        .await?
        {
            return Err(MultisigStoreError::NotFound("contract not found".into()));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, fields(%contract, on_chain_counter))]
    async fn propose_request(
        &self,
        contract: &Address,
        on_chain_counter: u64,
        build: &(dyn Fn(u64) -> Request<()> + Send + Sync),
    ) -> Result<ProposedRequest> {
        let address = contract.to_string();

        self.get_conn()
            .await?
            .transaction::<_, MultisigStoreError, _>(|conn| {
                Box::pin(async move {
                    let new_contract = NewContractRecord::builder().address(&address).build();
                    store::save_new_contract_if_absent(conn, new_contract).await?;

                    store::lock_contract_by_address(conn, &address)
                        .await?
                        .ok_or(MultisigStoreError::NotFound("contract not found".into()))?;

                    let pending = store::fetch_pending_requests_by_contract_address_from_counter(
                        conn,
                        &address,
                        to_signed(on_chain_counter)?,
                    )
                    .await?;

                    let mut nonce = on_chain_counter;

                    for record in pending {
                        let request = make_request(record)?;
                        let Some(counter) = request.counter() else { continue };

                        if build(counter).hash() == request.hash() {
                            tracing::info!(hash = request.hash(), counter, "request already proposed");
                            return Ok(ProposedRequest::builder().request(request).created(false).build());
                        }

                        nonce = nonce.max(counter + 1);
                    }

                    let request = build(nonce);

                    if let Some(record) = store::fetch_request_by_hash(conn, request.hash()).await? {
                        let request = make_request(record)?;
                        return Ok(ProposedRequest::builder().request(request).created(false).build());
                    }

                    let contract_address = request.contract().to_string();
                    let network = request.network().to_string();
                    let action_kind: &'static str = request.action().kind().into();
                    let info = serde_json::to_value(request.action())?;

                    let new_request = NewRequestRecord::builder()
                        .hash(request.hash())
                        .contract_address(&contract_address)
                        .network(&network)
                        .counter(to_signed(nonce)?)
                        .status(RequestStatus::Pending.into())
                        .action_kind(action_kind)
                        .info(info)
                        .build();

                    let request = store::save_new_request(conn, new_request).await.map(make_request)??;

                    tracing::info!(hash = request.hash(), nonce, "request proposed");

                    Ok(ProposedRequest::builder().request(request).created(true).build())
                })
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(%hash))]
    async fn get_request_by_hash(&self, hash: &str) -> Result<Option<Request>> {
        store::fetch_request_by_hash(&mut self.get_conn().await?, hash)
            .await?
            .map(make_request)
            .transpose()
    }

    #[tracing::instrument(skip_all, fields(%contract, counter))]
    async fn get_request_by_counter(
        &self,
        contract: &Address,
        counter: u64,
    ) -> Result<Option<Request>> {
        store::fetch_request_by_contract_address_and_counter(
            &mut self.get_conn().await?,
            &contract.to_string(),
            to_signed(counter)?,
        )
        .await?
        .map(make_request)
        .transpose()
    }

    #[tracing::instrument(skip_all, fields(%contract, ?status))]
    async fn list_requests(
        &self,
        contract: &Address,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Request>> {
        let conn = &mut self.get_conn().await?;
        let address = contract.to_string();

        match status {
            Some(status) => {
                store::stream_requests_by_contract_address_and_status(conn, &address, status.into())
                    .await?
                    .map_ok(make_request)
                    .map_err(From::from)
                    .map(Result::flatten)
                    .try_collect()
                    .await
            },
            None => {
                store::stream_requests_by_contract_address(conn, &address)
                    .await?
                    .map_ok(make_request)
                    .map_err(From::from)
                    .map(Result::flatten)
                    .try_collect()
                    .await
            },
        }
    }

    #[tracing::instrument(skip_all, fields(hash = request.hash(), kind = %request.action().kind()))]
    async fn save_observed_request(&self, request: Request<()>) -> Result<bool> {
        let contract_address = request.contract().to_string();
        let network = request.network().to_string();
        let action_kind: &'static str = request.action().kind().into();
        let info = serde_json::to_value(request.action())?;

        let new_request = NewRequestRecord::builder()
            .hash(request.hash())
            .contract_address(&contract_address)
            .network(&network)
            .maybe_counter(request.counter().map(to_signed).transpose()?)
            .status(request.status().into())
            .action_kind(action_kind)
            .info(info)
            .maybe_operation_hash(request.operation_hash())
            .build();

        let conn = &mut self.get_conn().await?;

        let new_contract = NewContractRecord::builder().address(&contract_address).build();
        store::save_new_contract_if_absent(conn, new_contract).await?;

        store::save_new_request_if_absent(conn, new_request).await.map_err(From::from)
    }

    #[tracing::instrument(skip_all, fields(%hash, %status))]
    async fn update_request_status(
        &self,
        hash: &str,
        status: RequestStatus,
        operation_hash: Option<&str>,
    ) -> Result<bool> {
        store::update_status_by_request_hash(
            &mut self.get_conn().await?,
            hash,
            status.into(),
            operation_hash,
        )
        .await
        .map_err(From::from)
    }

    #[tracing::instrument(
        skip_all,
        fields(request_hash = signature.request_hash(), index = signature.index(), kind = %signature.kind()),
    )]
    async fn save_signature(&self, signature: RequestSignature<()>) -> Result<bool> {
        let value = signature.signature().to_string();

        let signer_index =
            i32::try_from(signature.index()).map_err(|_| MultisigStoreError::InvalidValue)?;

        let new_signature = NewSignatureRecord::builder()
            .request_hash(signature.request_hash())
            .signer_index(signer_index)
            .signature(&value)
            .kind(signature.kind().into())
            .build();

        store::save_new_signature_if_absent(&mut self.get_conn().await?, new_signature)
            .await
            .map_err(From::from)
    }

    #[tracing::instrument(skip_all)]
    async fn get_signature_by_value(
        &self,
        signature: &Signature,
    ) -> Result<Option<RequestSignature>> {
        store::fetch_signature_by_value(&mut self.get_conn().await?, &signature.to_string())
            .await?
            .map(make_signature)
            .transpose()
    }

    #[tracing::instrument(skip_all, fields(%hash, %kind))]
    async fn get_signatures_by_request(
        &self,
        hash: &str,
        kind: SignatureType,
    ) -> Result<Vec<RequestSignature>> {
        store::stream_signatures_by_request_hash_and_kind(
            &mut self.get_conn().await?,
            hash,
            kind.into(),
        )
        .await?
        .map_ok(make_signature)
        .map_err(From::from)
        .map(Result::flatten)
        .try_collect()
        .await
    }
}

fn to_signed(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| MultisigStoreError::InvalidValue)
}

fn to_unsigned(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| MultisigStoreError::InvalidValue)
}

fn make_contract(contract_record: ContractRecord) -> Result<Contract> {
    let ContractRecordDissolved { address, last_level, created_at, updated_at } =
        contract_record.dissolve();

    let address = address.parse().map_err(|_| MultisigStoreError::InvalidValue)?;
    let timestamps = Timestamps::builder().created_at(created_at).updated_at(updated_at).build();

    let contract = Contract::builder()
        .address(address)
        .last_level(to_unsigned(last_level)?)
        .aux(timestamps)
        .build();

    Ok(contract)
}

fn make_request(request_record: RequestRecord) -> Result<Request> {
    let RequestRecordDissolved {
        hash,
        contract_address,
        network,
        counter,
        status,
        action_kind,
        info,
        operation_hash,
        created_at,
        updated_at,
    } = request_record.dissolve();

    let contract = contract_address.parse().map_err(|_| MultisigStoreError::InvalidValue)?;
    let network = network.parse().map_err(|_| MultisigStoreError::InvalidValue)?;
    let counter = counter.map(to_unsigned).transpose()?;
    let action: Action = serde_json::from_value(info)?;

    if <&str>::from(action.kind()) != action_kind {
        return Err(MultisigStoreError::Serialization(
            format!("action info of kind {} stored as {action_kind}", action.kind()).into(),
        ));
    }

    let timestamps = Timestamps::builder().created_at(created_at).updated_at(updated_at).build();

    let request = Request::builder()
        .hash(hash)
        .contract(contract)
        .network(network)
        .maybe_counter(counter)
        .status(status.into_inner())
        .action(action)
        .maybe_operation_hash(operation_hash)
        .aux(timestamps)
        .build();

    Ok(request)
}

fn make_signature(signature_record: SignatureRecord) -> Result<RequestSignature> {
    let SignatureRecordDissolved { request_hash, signer_index, signature, kind, created_at, .. } =
        signature_record.dissolve();

    let index = u32::try_from(signer_index).map_err(|_| MultisigStoreError::InvalidValue)?;
    let signature = signature.parse().map_err(|_| MultisigStoreError::InvalidValue)?;
    let timestamps = Timestamps::builder().created_at(created_at).updated_at(created_at).build();

    let signature = RequestSignature::builder()
        .request_hash(request_hash)
        .index(index)
        .signature(signature)
        .kind(kind.into_inner())
        .aux(timestamps)
        .build();

    Ok(signature)
}
