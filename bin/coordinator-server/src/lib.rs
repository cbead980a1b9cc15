#![allow(missing_docs)]

pub mod config;
pub mod tezos;

mod error;
mod payload;
mod routes;

use std::sync::Arc;

use axum::{Router, routing};
use bon::Builder;
use dissolve_derive::Dissolve;
use tezos_multisig_coordinator_engine::MultisigEngine;
use tezos_multisig_coordinator_store::MultisigStore;

use self::tezos::TezosRpcClient;

pub type Engine = MultisigEngine<MultisigStore, TezosRpcClient>;

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/health", routing::get(routes::health))
        .route("/api/v1/contract/storage/init", routing::post(routes::init_contract_storage))
        .route("/api/v1/contract/storage/update", routing::post(routes::update_contract_storage))
        .route("/api/v1/contract/info", routing::post(routes::get_contract_info))
        .route("/api/v1/operation/propose", routing::post(routes::propose_operation))
        .route("/api/v1/operation/payload", routing::post(routes::get_sign_payload))
        .route("/api/v1/operation/signature", routing::post(routes::add_signature))
        .route("/api/v1/operation/build", routing::post(routes::build_final_call))
        .route("/api/v1/operation/list", routing::post(routes::list_operations))
        .route("/api/v1/operation/sync", routing::post(routes::sync_contract))
        .route("/api/v1/vesting/storage/init", routing::post(routes::init_vesting_storage))
        .route("/api/v1/vesting/call", routing::post(routes::build_vesting_call))
        .route("/api/v1/vesting/info", routing::post(routes::get_vesting_info))
        .route("/api/v1/dexter/pools", routing::post(routes::get_dexter_pools))
        .with_state(app)
}

#[derive(Clone, Builder, Dissolve)]
pub struct App {
    engine: Arc<Engine>,
}
