//! Placement of action parameters inside the multisig's `or` tree.

use tezos_multisig_coordinator_domain::ActionType;
use tezos_multisig_michelson::{
    Direction::{self, Left as L, Right as R},
    Prim, select,
};

const TRANSFER: &[Direction] = &[L, L, L, L];
const DELEGATION: &[Direction] = &[L, L, L, R];
const ASSET_TRANSFER: &[Direction] = &[L, L, R, L];
const VESTING: &[Direction] = &[L, L, R, R];
pub(crate) const CUSTOM_PAYLOAD: &[Direction] = &[L, R];
const STORAGE_UPDATE: &[Direction] = &[R];

// `Pair (Pair chain_id multisig) (Pair counter arm)` down to `Pair counter arm`
pub(crate) const SIGNED_CALL: &[Direction] = &[R];
// `Pair (Pair counter arm) signatures` down to `Pair counter arm`
pub(crate) const MAIN_CALL: &[Direction] = &[L];
pub(crate) const CALL_COUNTER: &[Direction] = &[L];
pub(crate) const CALL_ARM: &[Direction] = &[R];

/// Root-to-leaf path of an action's arm, `None` for actions that are only observed.
pub fn action_path(kind: ActionType) -> Option<&'static [Direction]> {
    match kind {
        ActionType::Transfer => Some(TRANSFER),
        ActionType::Delegation => Some(DELEGATION),
        ActionType::Fa12Transfer | ActionType::Fa2Transfer => Some(ASSET_TRANSFER),
        ActionType::VestingVest | ActionType::VestingSetDelegate => Some(VESTING),
        ActionType::CustomPayload => Some(CUSTOM_PAYLOAD),
        ActionType::StorageUpdate => Some(STORAGE_UPDATE),
        ActionType::IncomeTransfer
        | ActionType::IncomeFa12Transfer
        | ActionType::IncomeFa2Transfer => None,
    }
}

/// Wraps `params` in one `Left`/`Right` per step of the path, leaf first.
pub fn encode_path(path: &[Direction], params: Prim) -> Prim {
    path.iter().rev().fold(params, |inner, direction| match direction {
        Direction::Left => Prim::left(inner),
        Direction::Right => Prim::right(inner),
    })
}

/// Reads the parameters back out of an arm built by [`encode_path`].
///
/// Unary nodes are entered whatever their direction and flattened pairs are folded to the right,
/// so the same walk also reads fields out of the signed payload and the final call.
pub fn decode_path(path: &[Direction], arm: &Prim) -> Option<Prim> {
    select(arm, path)
}

#[cfg(test)]
mod tests {
    use tezos_multisig_michelson::OpCode;

    use super::*;

    #[test]
    fn wraps_leaf_direction_first() {
        let arm = encode_path(DELEGATION, Prim::none());

        assert_eq!(
            arm,
            Prim::left(Prim::left(Prim::left(Prim::right(Prim::none()))))
        );
    }

    #[test]
    fn decode_inverts_encode_for_every_action() {
        let params = Prim::pair(Prim::bytes(vec![1, 2, 3]), Prim::int(1010));

        for kind in [
            ActionType::Transfer,
            ActionType::Delegation,
            ActionType::Fa12Transfer,
            ActionType::Fa2Transfer,
            ActionType::StorageUpdate,
            ActionType::CustomPayload,
            ActionType::VestingVest,
            ActionType::VestingSetDelegate,
        ] {
            let path = action_path(kind).unwrap();
            assert_eq!(decode_path(path, &encode_path(path, params.clone())), Some(params.clone()));
        }
    }

    #[test]
    fn income_has_no_arm() {
        assert!(action_path(ActionType::IncomeFa2Transfer).is_none());
    }

    #[test]
    fn decode_accepts_flattened_pairs_below_the_arm() {
        let flat = Prim::new(
            OpCode::D_PAIR,
            vec![Prim::int(1), Prim::int(2), Prim::int(3)],
            Vec::new(),
        );
        let arm = encode_path(TRANSFER, flat);

        let params = decode_path(TRANSFER, &arm).unwrap();
        assert_eq!(select(&params, &[R]), Some(Prim::pair(Prim::int(2), Prim::int(3))));
    }
}
