//! The node and indexer collaborator.

use std::borrow::Cow;

use async_trait::async_trait;
use bon::Builder;
use dissolve_derive::Dissolve;
use tezos_multisig_coordinator_utils::{Address, ChainId, PubKey};
use tezos_multisig_michelson::Prim;

/// Errors reported by a [`ChainClient`].
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The node or indexer could not be reached.
    #[error("transport error: {0}")]
    Transport(Cow<'static, str>),

    /// The node or indexer answered with something unexpected.
    #[error("invalid response: {0}")]
    InvalidResponse(Cow<'static, str>),

    /// The node or indexer does not know the requested entity.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),
}

impl ChainError {
    /// Builds a [`ChainError::Transport`].
    pub fn transport<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Transport(err.into())
    }

    /// Builds a [`ChainError::InvalidResponse`].
    pub fn invalid_response<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidResponse(err.into())
    }
}

/// Type sections of a contract script.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct ContractScript {
    /// The `parameter` type.
    parameter: Prim,

    /// The `storage` type.
    storage: Prim,
}

impl ContractScript {
    /// Returns the parameter type.
    pub fn parameter(&self) -> &Prim {
        &self.parameter
    }

    /// Returns the storage type.
    pub fn storage(&self) -> &Prim {
        &self.storage
    }
}

/// A transaction touching a contract, as reported by the indexer.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct ObservedOperation {
    /// Operation group hash.
    hash: String,

    /// Block level.
    level: u64,

    /// `false` for failed, backtracked or skipped operations.
    applied: bool,

    /// Amount in mutez.
    #[builder(default)]
    amount: u64,

    /// Source of the transaction.
    sender: Address,

    /// Destination of the transaction.
    target: Address,

    /// Called entrypoint, absent for plain transfers.
    entrypoint: Option<String>,

    /// Call argument, absent for plain transfers.
    parameters: Option<Prim>,
}

impl ObservedOperation {
    /// Returns the operation group hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns the block level.
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Returns whether the operation was applied.
    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Returns the amount in mutez.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Returns the source.
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Returns the destination.
    pub fn target(&self) -> &Address {
        &self.target
    }

    /// Returns the called entrypoint.
    pub fn entrypoint(&self) -> Option<&str> {
        self.entrypoint.as_deref()
    }

    /// Returns the call argument.
    pub fn parameters(&self) -> Option<&Prim> {
        self.parameters.as_ref()
    }
}

/// Read access to a Tezos node and an indexer.
///
/// Failures are reported as they happen; retrying is left to the implementation.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns the chain the node follows.
    async fn chain_id(&self) -> Result<ChainId, ChainError>;

    /// Returns the parameter and storage types of a contract.
    async fn contract_script(&self, address: &Address) -> Result<ContractScript, ChainError>;

    /// Returns the current storage value of a contract.
    async fn contract_storage(&self, address: &Address) -> Result<Prim, ChainError>;

    /// Returns the revealed public key of an implicit account.
    async fn manager_key(&self, address: &Address) -> Result<Option<PubKey>, ChainError>;

    /// Returns the balance of an account in mutez.
    async fn balance(&self, address: &Address) -> Result<u64, ChainError>;

    /// Returns the transactions sent to or emitted by `address` in blocks above `after_level`,
    /// oldest first. Token transfers naming `address` as receiver are included.
    async fn contract_operations(
        &self,
        address: &Address,
        after_level: u64,
    ) -> Result<Vec<ObservedOperation>, ChainError>;
}
