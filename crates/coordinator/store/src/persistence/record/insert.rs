use bon::Builder;
use diesel::prelude::Insertable;

use crate::persistence::{
    record::{SignatureKind, Status},
    schema,
};

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::contract)]
pub struct NewContractRecord<'a> {
    address: &'a str,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::request)]
pub struct NewRequestRecord<'a> {
    hash: &'a str,
    contract_address: &'a str,
    network: &'a str,
    counter: Option<i64>,
    status: Status,
    action_kind: &'a str,
    info: serde_json::Value,
    operation_hash: Option<&'a str>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::request_signature)]
pub struct NewSignatureRecord<'a> {
    request_hash: &'a str,
    signer_index: i32,
    signature: &'a str,
    kind: SignatureKind,
}
