//! Domain types for the multisig coordinator.
//!
//! This crate provides the models shared by the store, the engine and the server: the actions a
//! multisig contract can be asked to perform, the requests that carry them through signing, the
//! signatures collected for those requests and the contracts they belong to.

pub mod action;
pub mod contract;
pub mod request;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::{
    action::{Action, ActionType, TransferUnit, Tx},
    contract::Contract,
    request::{Request, RequestSignature, RequestStatus, SignatureType},
};

/// Timestamp metadata for tracking entity creation and modification times.
///
/// This struct is commonly used as auxiliary data (`AUX`) in other domain types
/// to track when entities were created and last updated.
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamps {
    /// The timestamp when the entity was created.
    created_at: DateTime<Utc>,
    /// The timestamp when the entity was last updated.
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
