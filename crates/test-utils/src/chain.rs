use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use tezos_multisig_coordinator_engine::{ChainClient, ChainError, ContractScript, ObservedOperation};
use tezos_multisig_coordinator_utils::{Address, ChainId, PubKey};
use tezos_multisig_michelson::{Direction, Prim, select};

use crate::fixtures::{multisig_parameter_type, multisig_storage, multisig_storage_type};

/// A [`ChainClient`] answering from fixtures set up by the test.
pub struct MockChain {
    chain_id: ChainId,
    state: Mutex<ChainState>,
}

#[derive(Default)]
struct ChainState {
    scripts: HashMap<Address, ContractScript>,
    storages: HashMap<Address, Prim>,
    manager_keys: HashMap<Address, PubKey>,
    balances: HashMap<Address, u64>,
    operations: HashMap<Address, Vec<ObservedOperation>>,
}

impl MockChain {
    /// Creates an empty chain identified by `chain_id`.
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id, state: Mutex::default() }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    /// Deploys a multisig with the given counter and owners, revealing every owner key.
    pub fn with_multisig(&self, contract: Address, counter: u64, threshold: u64, keys: &[PubKey]) {
        let script = ContractScript::builder()
            .parameter(multisig_parameter_type())
            .storage(multisig_storage_type())
            .build();

        self.set_script(contract, script);
        self.set_storage(contract, multisig_storage(counter, threshold, keys));

        for key in keys {
            self.add_manager_key(key);
        }
    }

    /// Moves the counter of a deployed multisig, as executing a call would.
    pub fn set_counter(&self, contract: Address, counter: u64) {
        let mut state = self.state();

        let storage = state.storages.get(&contract).expect("contract is deployed");
        let rest = select(storage, &[Direction::Right]).expect("multisig storage is a pair");

        state.storages.insert(contract, Prim::pair(Prim::int(counter), rest));
    }

    pub fn set_script(&self, address: Address, script: ContractScript) {
        self.state().scripts.insert(address, script);
    }

    pub fn set_storage(&self, address: Address, storage: Prim) {
        self.state().storages.insert(address, storage);
    }

    /// Reveals `key` for the implicit account it controls.
    pub fn add_manager_key(&self, key: &PubKey) {
        self.state().manager_keys.insert(key.address(), key.clone());
    }

    pub fn set_balance(&self, address: Address, balance: u64) {
        self.state().balances.insert(address, balance);
    }

    /// Makes `operation` visible to [`ChainClient::contract_operations`] queries for `watched`.
    pub fn push_operation(&self, watched: Address, operation: ObservedOperation) {
        self.state().operations.entry(watched).or_default().push(operation);
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<ChainId, ChainError> {
        Ok(self.chain_id)
    }

    async fn contract_script(&self, address: &Address) -> Result<ContractScript, ChainError> {
        self.state()
            .scripts
            .get(address)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(address.to_string().into()))
    }

    async fn contract_storage(&self, address: &Address) -> Result<Prim, ChainError> {
        self.state()
            .storages
            .get(address)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(address.to_string().into()))
    }

    async fn manager_key(&self, address: &Address) -> Result<Option<PubKey>, ChainError> {
        Ok(self.state().manager_keys.get(address).cloned())
    }

    async fn balance(&self, address: &Address) -> Result<u64, ChainError> {
        Ok(self.state().balances.get(address).copied().unwrap_or_default())
    }

    async fn contract_operations(
        &self,
        address: &Address,
        after_level: u64,
    ) -> Result<Vec<ObservedOperation>, ChainError> {
        let mut operations: Vec<_> = self
            .state()
            .operations
            .get(address)
            .into_iter()
            .flatten()
            .filter(|operation| operation.level() > after_level)
            .cloned()
            .collect();

        operations.sort_by_key(ObservedOperation::level);

        Ok(operations)
    }
}
