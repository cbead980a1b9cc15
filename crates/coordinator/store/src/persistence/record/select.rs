use chrono::{DateTime, Utc};
use diesel::prelude::Queryable;
use dissolve_derive::Dissolve;

use crate::persistence::record::{SignatureKind, Status};

#[derive(Debug, Dissolve, Queryable)]
pub struct ContractRecord {
    address: String,
    last_level: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct RequestRecord {
    hash: String,
    contract_address: String,
    network: String,
    counter: Option<i64>,
    status: Status,
    action_kind: String,
    info: serde_json::Value,
    operation_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct SignatureRecord {
    id: i64,
    request_hash: String,
    signer_index: i32,
    signature: String,
    kind: SignatureKind,
    created_at: DateTime<Utc>,
}
