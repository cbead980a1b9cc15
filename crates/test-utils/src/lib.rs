//! Test utilities for the Tezos multisig coordinator.
//!
//! This crate provides in-process stand-ins for the collaborators of the engine: an
//! [`InMemoryStore`] implementing the repository trait, a [`MockChain`] answering chain reads
//! from fixtures, and [`TestSigner`]s producing signatures the engine accepts on all three
//! curves. Contract type fixtures live in [`fixtures`].

pub mod fixtures;

mod chain;
mod signer;
mod store;

pub use self::{chain::MockChain, signer::TestSigner, store::InMemoryStore};
