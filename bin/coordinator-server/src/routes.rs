use core::str::FromStr;

use axum::{Json, extract::State, http::StatusCode};
use itertools::Itertools;
use tezos_multisig_coordinator_engine::{
    contract::vesting::VestingCall,
    request::{
        AddSignatureRequest, BuildContractStorageRequest, BuildFinalCallRequest,
        BuildVestingStorageRequest, GetSignPayloadRequest, ListOperationsRequest,
        ProposeOperationRequest, RequestError, UpdateContractStorageRequest,
    },
    response::{
        AddSignatureResponseDissolved, ContractCallResponse, ContractCallResponseDissolved,
        ContractInfoResponseDissolved, ListOperationsResponseDissolved, ProposeOperationResponse,
        ProposeOperationResponseDissolved, SignPayloadResponseDissolved,
        SyncContractResponseDissolved,
    },
};
use tezos_multisig_coordinator_utils::Address;

use crate::{
    App, AppDissolved,
    error::AppError,
    payload::{
        request::{
            AddSignatureRequestPayload, AddSignatureRequestPayloadDissolved,
            ContractRequestPayload, ContractRequestPayloadDissolved,
            InitContractStorageRequestPayload, InitContractStorageRequestPayloadDissolved,
            InitVestingStorageRequestPayload, InitVestingStorageRequestPayloadDissolved,
            ListOperationsRequestPayload, ListOperationsRequestPayloadDissolved,
            OperationRequestPayload, OperationRequestPayloadDissolved,
            ProposeOperationRequestPayload, ProposeOperationRequestPayloadDissolved,
            UpdateContractStorageRequestPayload, UpdateContractStorageRequestPayloadDissolved,
            VestingCallRequestPayload,
        },
        response::{
            AddSignatureResponsePayload, ContractCallResponsePayload, ContractInfoResponsePayload,
            ContractStorageResponsePayload, DexterPoolsResponsePayload,
            ListOperationsResponsePayload, ProposeOperationResponsePayload,
            SignPayloadResponsePayload, SyncContractResponsePayload, VestingInfoResponsePayload,
        },
    },
};

#[tracing::instrument]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[tracing::instrument(skip_all)]
pub async fn init_contract_storage(
    State(app): State<App>,
    Json(payload): Json<InitContractStorageRequestPayload>,
) -> Result<Json<ContractStorageResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let InitContractStorageRequestPayloadDissolved { threshold, addresses } = payload.dissolve();

    let request = BuildContractStorageRequest::builder()
        .threshold(threshold)
        .addresses(parse_addresses(&addresses)?)
        .build()
        .map_err(RequestError::from)?;

    let storage = engine
        .build_contract_storage(request)
        .await
        .inspect_err(|e| tracing::error!("failed to build contract storage: {e}"))?;

    Ok(Json(ContractStorageResponsePayload::builder().storage(storage).build()))
}

#[tracing::instrument(skip_all)]
pub async fn update_contract_storage(
    State(app): State<App>,
    Json(payload): Json<UpdateContractStorageRequestPayload>,
) -> Result<Json<ProposeOperationResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let UpdateContractStorageRequestPayloadDissolved { contract, threshold, addresses } =
        payload.dissolve();

    let request = UpdateContractStorageRequest::builder()
        .contract(parse_param(&contract, "contract")?)
        .threshold(threshold)
        .addresses(parse_addresses(&addresses)?)
        .build()
        .map_err(RequestError::from)?;

    let response = engine
        .propose_storage_update(request)
        .await
        .inspect_err(|e| tracing::error!("failed to propose storage update: {e}"))?;

    Ok(Json(propose_response_payload(response)))
}

#[tracing::instrument(skip_all)]
pub async fn get_contract_info(
    State(app): State<App>,
    Json(payload): Json<ContractRequestPayload>,
) -> Result<Json<ContractInfoResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let ContractRequestPayloadDissolved { contract } = payload.dissolve();

    let ContractInfoResponseDissolved { balance, counter, threshold, keys } = engine
        .contract_info(&parse_param(&contract, "contract")?)
        .await
        .inspect_err(|e| tracing::error!("failed to get contract info: {e}"))?
        .dissolve();

    let response = ContractInfoResponsePayload::builder()
        .balance(balance)
        .counter(counter)
        .threshold(threshold)
        .keys(keys)
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn propose_operation(
    State(app): State<App>,
    Json(payload): Json<ProposeOperationRequestPayload>,
) -> Result<Json<ProposeOperationResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let ProposeOperationRequestPayloadDissolved { contract, action } = payload.dissolve();

    let request = ProposeOperationRequest::builder()
        .contract(parse_param(&contract, "contract")?)
        .action(action)
        .build();

    let response = engine
        .propose_operation(request)
        .await
        .inspect_err(|e| tracing::error!("failed to propose operation: {e}"))?;

    Ok(Json(propose_response_payload(response)))
}

#[tracing::instrument(skip_all)]
pub async fn get_sign_payload(
    State(app): State<App>,
    Json(payload): Json<OperationRequestPayload>,
) -> Result<Json<SignPayloadResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let OperationRequestPayloadDissolved { request_hash, kind } = payload.dissolve();

    let request = GetSignPayloadRequest::builder().request_hash(request_hash).kind(kind).build();

    let SignPayloadResponseDissolved { request_hash, payload } = engine
        .get_sign_payload(request)
        .await
        .inspect_err(|e| tracing::error!("failed to get sign payload: {e}"))?
        .dissolve();

    let response =
        SignPayloadResponsePayload::builder().request_hash(request_hash).payload(payload).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn add_signature(
    State(app): State<App>,
    Json(payload): Json<AddSignatureRequestPayload>,
) -> Result<Json<AddSignatureResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let AddSignatureRequestPayloadDissolved { request_hash, pub_key, payload, signature, kind } =
        payload.dissolve();

    let request = AddSignatureRequest::builder()
        .request_hash(request_hash)
        .pub_key(parse_param(&pub_key, "pub_key")?)
        .maybe_payload(payload.as_deref().map(|p| parse_param(p, "payload")).transpose()?)
        .signature(parse_param(&signature, "signature")?)
        .kind(kind)
        .build();

    let AddSignatureResponseDissolved { signature_count, threshold } = engine
        .add_signature(request)
        .await
        .inspect_err(|e| tracing::error!("failed to add signature: {e}"))?
        .dissolve();

    let response = AddSignatureResponsePayload::builder()
        .signature_count(signature_count)
        .threshold(threshold)
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn build_final_call(
    State(app): State<App>,
    Json(payload): Json<OperationRequestPayload>,
) -> Result<Json<ContractCallResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let OperationRequestPayloadDissolved { request_hash, kind } = payload.dissolve();

    let request = BuildFinalCallRequest::builder().request_hash(request_hash).kind(kind).build();

    let response = engine
        .build_final_call(request)
        .await
        .inspect_err(|e| tracing::error!("failed to build final call: {e}"))?;

    Ok(Json(call_response_payload(response)))
}

#[tracing::instrument(skip_all)]
pub async fn list_operations(
    State(app): State<App>,
    Json(payload): Json<ListOperationsRequestPayload>,
) -> Result<Json<ListOperationsResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let ListOperationsRequestPayloadDissolved { contract, status } = payload.dissolve();

    let request = ListOperationsRequest::builder()
        .contract(parse_param(&contract, "contract")?)
        .maybe_status(status.as_deref().map(|s| parse_param(s, "status")).transpose()?)
        .build();

    let ListOperationsResponseDissolved { requests } = engine
        .list_operations(request)
        .await
        .inspect_err(|e| tracing::error!("failed to list operations: {e}"))?
        .dissolve();

    let response = ListOperationsResponsePayload::builder()
        .operations(requests.into_iter().map(From::from).collect())
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn sync_contract(
    State(app): State<App>,
    Json(payload): Json<ContractRequestPayload>,
) -> Result<Json<SyncContractResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let ContractRequestPayloadDissolved { contract } = payload.dissolve();

    let SyncContractResponseDissolved { processed, last_level } = engine
        .sync_contract_operations(&parse_param(&contract, "contract")?)
        .await
        .inspect_err(|e| tracing::error!("failed to sync contract: {e}"))?
        .dissolve();

    let response =
        SyncContractResponsePayload::builder().processed(processed).last_level(last_level).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn init_vesting_storage(
    State(app): State<App>,
    Json(payload): Json<InitVestingStorageRequestPayload>,
) -> Result<Json<ContractStorageResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let InitVestingStorageRequestPayloadDissolved {
        target,
        delegate_admin,
        epoch,
        seconds_per_tick,
        tokens_per_tick,
    } = payload.dissolve();

    let request = BuildVestingStorageRequest::builder()
        .target(parse_param(&target, "target")?)
        .delegate_admin(parse_param(&delegate_admin, "delegate_admin")?)
        .epoch(epoch)
        .seconds_per_tick(seconds_per_tick)
        .tokens_per_tick(tokens_per_tick)
        .build()
        .map_err(RequestError::from)?;

    let storage = engine.build_vesting_storage(request);

    Ok(Json(ContractStorageResponsePayload::builder().storage(storage).build()))
}

#[tracing::instrument(skip_all)]
pub async fn build_vesting_call(
    State(app): State<App>,
    Json(payload): Json<VestingCallRequestPayload>,
) -> Result<Json<ContractCallResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let call = match payload {
        VestingCallRequestPayload::SetDelegate { delegate } => VestingCall::SetDelegate(
            delegate.as_deref().map(|d| parse_param(d, "delegate")).transpose()?,
        ),
        VestingCallRequestPayload::Vest { ticks } => VestingCall::Vest(ticks),
    };

    let response = engine.build_vesting_call(&call)?;

    Ok(Json(call_response_payload(response)))
}

#[tracing::instrument(skip_all)]
pub async fn get_vesting_info(
    State(app): State<App>,
    Json(payload): Json<ContractRequestPayload>,
) -> Result<Json<VestingInfoResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let ContractRequestPayloadDissolved { contract } = payload.dissolve();

    let storage = engine
        .vesting_storage(&parse_param(&contract, "contract")?)
        .await
        .inspect_err(|e| tracing::error!("failed to read vesting storage: {e}"))?;

    let response = VestingInfoResponsePayload::builder()
        .target(*storage.target())
        .delegate_admin(*storage.delegate_admin())
        .vested(storage.vested())
        .epoch(storage.epoch())
        .seconds_per_tick(storage.seconds_per_tick())
        .tokens_per_tick(storage.tokens_per_tick())
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn get_dexter_pools(
    State(app): State<App>,
    Json(payload): Json<ContractRequestPayload>,
) -> Result<Json<DexterPoolsResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();

    let ContractRequestPayloadDissolved { contract } = payload.dissolve();

    let pools = engine
        .dexter_pools(&parse_param(&contract, "contract")?)
        .await
        .inspect_err(|e| tracing::error!("failed to read dexter pools: {e}"))?;

    let response = DexterPoolsResponsePayload::builder()
        .token_pool(pools.token_pool().to_string())
        .xtz_pool(pools.xtz_pool().to_string())
        .build();

    Ok(Json(response))
}

fn parse_param<T>(value: &str, field: &'static str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    value
        .parse()
        .inspect_err(|e| tracing::warn!("failed to decode {field}: {e}"))
        .map_err(|_| AppError::InvalidParam(field))
}

fn parse_addresses(addresses: &[String]) -> Result<Vec<Address>, AppError> {
    addresses.iter().map(|address| parse_param(address, "addresses")).try_collect()
}

fn propose_response_payload(response: ProposeOperationResponse) -> ProposeOperationResponsePayload {
    let ProposeOperationResponseDissolved { request, created } = response.dissolve();

    ProposeOperationResponsePayload::builder().operation(request.into()).created(created).build()
}

fn call_response_payload(response: ContractCallResponse) -> ContractCallResponsePayload {
    let ContractCallResponseDissolved { entrypoint, value } = response.dissolve();

    ContractCallResponsePayload::builder().entrypoint(entrypoint).value(value).build()
}
