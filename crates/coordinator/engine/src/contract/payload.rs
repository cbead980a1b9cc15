//! Signable payloads and the final `main_parameter` call.
//!
//! Owners sign the watermarked forging of
//!
//! ```text
//! Pair (Pair chain_id multisig) (Pair counter arm)
//! ```
//!
//! and the contract is later called with the inner `Pair counter arm` followed by one optional
//! signature per owner slot.

use tezos_multisig_coordinator_domain::Action;
use tezos_multisig_coordinator_utils::{Address, ChainId, Payload, Signature};
use tezos_multisig_michelson::{OpCode, Prim};

use super::{
    params::build_action_params,
    path::{
        CALL_ARM, CALL_COUNTER, CUSTOM_PAYLOAD, MAIN_CALL, SIGNED_CALL, action_path, decode_path,
        encode_path,
    },
};
use crate::error::MultisigEngineErrorKind;

/// Entrypoint every multisig action goes through.
pub const MAIN_ENTRYPOINT: &str = "main_parameter";

/// Encodes `action` as its arm of the multisig parameter.
pub fn action_arm(action: &Action, contract: &Address) -> Result<Prim, MultisigEngineErrorKind> {
    let path = action_path(action.kind()).ok_or_else(|| MultisigEngineErrorKind::bad_param("type"))?;

    Ok(encode_path(path, build_action_params(action, contract)?))
}

/// The no-op lambda `{ DROP ; NIL operation }` on the custom payload arm.
///
/// Executing it consumes the counter, which invalidates every other payload signed for it.
pub fn reject_arm() -> Prim {
    let noop = Prim::Seq(vec![
        Prim::nullary(OpCode::I_DROP),
        Prim::unary(OpCode::I_NIL, Prim::nullary(OpCode::T_OPERATION)),
    ]);

    encode_path(CUSTOM_PAYLOAD, noop)
}

/// Binds `arm` to a network, a contract and a counter.
pub fn sign_payload(network: &ChainId, contract: &Address, counter: u64, arm: Prim) -> Payload {
    let value = Prim::pair(
        Prim::pair(Prim::bytes(network.to_bytes()), Prim::bytes(contract.to_bytes())),
        Prim::pair(Prim::int(counter), arm),
    );

    Payload::from_prim(&value)
}

/// Builds the `main_parameter` argument from a signed payload and one slot per owner key.
pub fn final_call(
    payload: &Payload,
    signatures: &[Option<Signature>],
) -> Result<Prim, MultisigEngineErrorKind> {
    let value = payload.to_prim()?;

    let action = decode_path(SIGNED_CALL, &value)
        .ok_or_else(|| MultisigEngineErrorKind::other("payload is not a pair"))?;

    let signatures = signatures
        .iter()
        .map(|slot| match slot {
            Some(signature) => Prim::some(Prim::bytes(signature.to_bytes())),
            None => Prim::none(),
        })
        .collect();

    Ok(Prim::pair(action, Prim::Seq(signatures)))
}

/// The counter and arm of an observed `main_parameter` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainCall {
    counter: u64,
    arm: Prim,
}

impl MainCall {
    /// Reads `Pair (Pair counter arm) signatures`.
    pub fn parse(value: &Prim) -> Option<Self> {
        let call = decode_path(MAIN_CALL, value)?;
        let counter = decode_path(CALL_COUNTER, &call)?.as_u64()?;
        let arm = decode_path(CALL_ARM, &call)?;

        Some(Self { counter, arm })
    }

    /// Returns the counter the call consumed.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Returns the executed arm.
    pub fn arm(&self) -> &Prim {
        &self.arm
    }

    /// Returns `true` when the call executed the reject no-op.
    pub fn is_reject(&self) -> bool {
        self.arm == reject_arm()
    }
}
