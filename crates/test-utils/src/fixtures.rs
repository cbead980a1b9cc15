//! Contract types and values used across tests.

use tezos_multisig_coordinator_utils::PubKey;
use tezos_multisig_michelson::{OpCode, Prim};

fn annotated(prim: Prim, anno: &str) -> Prim {
    prim.with_annots(vec![anno.to_string()])
}

fn field(op: OpCode, anno: &str) -> Prim {
    annotated(Prim::nullary(op), anno)
}

/// `pair (nat %stored_counter) (pair (nat %threshold) (list %keys key))`
pub fn multisig_storage_type() -> Prim {
    Prim::binary(
        OpCode::T_PAIR,
        field(OpCode::T_NAT, "%stored_counter"),
        Prim::binary(
            OpCode::T_PAIR,
            field(OpCode::T_NAT, "%threshold"),
            annotated(Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_KEY)), "%keys"),
        ),
    )
}

/// `or (unit %default) (pair %main_parameter (pair nat (lambda unit (list operation))) (list (option signature)))`
pub fn multisig_parameter_type() -> Prim {
    let lambda = Prim::binary(
        OpCode::T_LAMBDA,
        Prim::nullary(OpCode::T_UNIT),
        Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_OPERATION)),
    );
    let signatures =
        Prim::unary(OpCode::T_LIST, Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_SIGNATURE)));

    Prim::binary(
        OpCode::T_OR,
        field(OpCode::T_UNIT, "%default"),
        annotated(
            Prim::binary(
                OpCode::T_PAIR,
                Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_NAT), lambda),
                signatures,
            ),
            "%main_parameter",
        ),
    )
}

/// A multisig storage value with keys as raw bytes.
pub fn multisig_storage(counter: u64, threshold: u64, keys: &[PubKey]) -> Prim {
    Prim::pair(
        Prim::int(counter),
        Prim::pair(
            Prim::int(threshold),
            Prim::Seq(keys.iter().map(|key| Prim::bytes(key.to_bytes())).collect()),
        ),
    )
}

/// Parameter type of an FA1.2 token: `approve` and `transfer` entrypoints.
pub fn fa12_parameter_type() -> Prim {
    let transfer = annotated(
        Prim::binary(
            OpCode::T_PAIR,
            field(OpCode::T_ADDRESS, ":from"),
            Prim::binary(OpCode::T_PAIR, field(OpCode::T_ADDRESS, ":to"), field(OpCode::T_NAT, ":value")),
        ),
        "%transfer",
    );
    let approve = annotated(
        Prim::binary(OpCode::T_PAIR, field(OpCode::T_ADDRESS, ":spender"), field(OpCode::T_NAT, ":value")),
        "%approve",
    );

    Prim::binary(OpCode::T_OR, approve, transfer)
}

/// Parameter type of an FA2 token reduced to its `transfer` entrypoint.
pub fn fa2_parameter_type() -> Prim {
    let tx = Prim::binary(
        OpCode::T_PAIR,
        field(OpCode::T_ADDRESS, "%to_"),
        Prim::binary(OpCode::T_PAIR, field(OpCode::T_NAT, "%token_id"), field(OpCode::T_NAT, "%amount")),
    );
    let unit = Prim::binary(
        OpCode::T_PAIR,
        field(OpCode::T_ADDRESS, "%from_"),
        annotated(Prim::unary(OpCode::T_LIST, tx), "%txs"),
    );

    annotated(Prim::unary(OpCode::T_LIST, unit), "%transfer")
}

/// A storage type every contract has, for tokens whose storage the tests never read.
pub fn unit_type() -> Prim {
    Prim::nullary(OpCode::T_UNIT)
}
