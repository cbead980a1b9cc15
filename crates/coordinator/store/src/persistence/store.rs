mod error;

pub use self::error::StoreError;

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, dsl};
use diesel_async::RunQueryDsl;
use futures::{Stream, TryStreamExt};
use tezos_multisig_coordinator_domain::RequestStatus;

use super::{
    pool::DbConn,
    record::{
        SignatureKind, Status,
        insert::{NewContractRecord, NewRequestRecord, NewSignatureRecord},
        select::{ContractRecord, RequestRecord, SignatureRecord},
    },
    schema,
};

use self::error::Result;

pub async fn fetch_contract_by_address(
    conn: &mut DbConn,
    address: &str,
) -> Result<Option<ContractRecord>> {
    schema::contract::table
        .filter(schema::contract::address.eq(address))
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

/// Locks the contract row until the surrounding transaction ends.
pub async fn lock_contract_by_address(
    conn: &mut DbConn,
    address: &str,
) -> Result<Option<ContractRecord>> {
    schema::contract::table
        .filter(schema::contract::address.eq(address))
        .for_update()
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn stream_contracts(
    conn: &mut DbConn,
) -> Result<impl Stream<Item = Result<ContractRecord>>> {
    let stream = schema::contract::table
        .select(schema::contract::all_columns)
        .order_by(schema::contract::created_at.asc())
        .load_stream(conn)
        .await?
        .map_err(From::from);

    Ok(stream)
}

pub async fn save_new_contract_if_absent(
    conn: &mut DbConn,
    new_contract: NewContractRecord<'_>,
) -> Result<()> {
    diesel::insert_into(schema::contract::table)
        .values(new_contract)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn update_last_level_by_contract_address(
    conn: &mut DbConn,
    address: &str,
    last_level: i64,
) -> Result<bool> {
    let affected = diesel::update(schema::contract::table.filter(schema::contract::address.eq(address)))
        .set((
            schema::contract::last_level.eq(last_level),
            schema::contract::updated_at.eq(dsl::now),
        ))
        .execute(conn)
        .await?;

    Ok(affected == 1)
}

pub async fn fetch_pending_requests_by_contract_address_from_counter(
    conn: &mut DbConn,
    contract_address: &str,
    counter: i64,
) -> Result<Vec<RequestRecord>> {
    schema::request::table
        .filter(schema::request::contract_address.eq(contract_address))
        .filter(schema::request::status.eq(Status::from(RequestStatus::Pending)))
        .filter(schema::request::counter.ge(counter))
        .order_by(schema::request::counter.asc())
        .load(conn)
        .await
        .map_err(From::from)
}

pub async fn fetch_request_by_hash(conn: &mut DbConn, hash: &str) -> Result<Option<RequestRecord>> {
    schema::request::table
        .filter(schema::request::hash.eq(hash))
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

/// Prefers the pending request when settled ones share the counter.
pub async fn fetch_request_by_contract_address_and_counter(
    conn: &mut DbConn,
    contract_address: &str,
    counter: i64,
) -> Result<Option<RequestRecord>> {
    schema::request::table
        .filter(schema::request::contract_address.eq(contract_address))
        .filter(schema::request::counter.eq(counter))
        .order_by((
            schema::request::status.eq(Status::from(RequestStatus::Pending)).desc(),
            schema::request::created_at.desc(),
        ))
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn stream_requests_by_contract_address(
    conn: &mut DbConn,
    contract_address: &str,
) -> Result<impl Stream<Item = Result<RequestRecord>>> {
    let stream = schema::request::table
        .filter(schema::request::contract_address.eq(contract_address))
        .order_by(schema::request::created_at.desc())
        .load_stream(conn)
        .await?
        .map_err(From::from);

    Ok(stream)
}

pub async fn stream_requests_by_contract_address_and_status(
    conn: &mut DbConn,
    contract_address: &str,
    status: Status,
) -> Result<impl Stream<Item = Result<RequestRecord>>> {
    let stream = schema::request::table
        .filter(schema::request::contract_address.eq(contract_address))
        .filter(schema::request::status.eq(status))
        .order_by(schema::request::created_at.desc())
        .load_stream(conn)
        .await?
        .map_err(From::from);

    Ok(stream)
}

pub async fn save_new_request(conn: &mut DbConn, new_request: NewRequestRecord<'_>) -> Result<RequestRecord> {
    diesel::insert_into(schema::request::table)
        .values(new_request)
        .returning(schema::request::all_columns)
        .get_result(conn)
        .await
        .map_err(From::from)
}

/// Returns `false` when a request with the same hash already exists.
pub async fn save_new_request_if_absent(
    conn: &mut DbConn,
    new_request: NewRequestRecord<'_>,
) -> Result<bool> {
    let affected = diesel::insert_into(schema::request::table)
        .values(new_request)
        .on_conflict(schema::request::hash)
        .do_nothing()
        .execute(conn)
        .await?;

    Ok(affected == 1)
}

pub async fn update_status_by_request_hash(
    conn: &mut DbConn,
    hash: &str,
    new_status: Status,
    operation_hash: Option<&str>,
) -> Result<bool> {
    let affected = diesel::update(schema::request::table.filter(schema::request::hash.eq(hash)))
        .set((
            schema::request::status.eq(new_status),
            schema::request::operation_hash.eq(operation_hash),
            schema::request::updated_at.eq(dsl::now),
        ))
        .execute(conn)
        .await?;

    assert!(affected <= 1, "duplicate request hash must not exist");

    Ok(affected == 1)
}

/// Returns `false` when the signature value is already stored, or when the owner's slot in that
/// lane is already taken.
pub async fn save_new_signature_if_absent(
    conn: &mut DbConn,
    new_signature: NewSignatureRecord<'_>,
) -> Result<bool> {
    let affected = diesel::insert_into(schema::request_signature::table)
        .values(new_signature)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    Ok(affected == 1)
}

pub async fn fetch_signature_by_value(
    conn: &mut DbConn,
    signature: &str,
) -> Result<Option<SignatureRecord>> {
    schema::request_signature::table
        .filter(schema::request_signature::signature.eq(signature))
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn stream_signatures_by_request_hash_and_kind(
    conn: &mut DbConn,
    request_hash: &str,
    kind: SignatureKind,
) -> Result<impl Stream<Item = Result<SignatureRecord>>> {
    let stream = schema::request_signature::table
        .filter(schema::request_signature::request_hash.eq(request_hash))
        .filter(schema::request_signature::kind.eq(kind))
        .order_by(schema::request_signature::signer_index.asc())
        .load_stream(conn)
        .await?
        .map_err(From::from);

    Ok(stream)
}
