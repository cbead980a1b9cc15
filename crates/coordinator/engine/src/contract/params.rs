//! Micheline arguments of each multisig action.

use tezos_multisig_coordinator_domain::{Action, TransferUnit};
use tezos_multisig_coordinator_utils::{Address, Payload, PubKey};
use tezos_multisig_michelson::Prim;

use crate::error::MultisigEngineErrorKind;

/// Largest owner set a multisig contract is created or updated with.
pub const MAX_KEYS: usize = 20;

/// Rejects actions that cannot be proposed, before anything is built or stored.
pub fn validate_action(action: &Action) -> Result<(), MultisigEngineErrorKind> {
    match action {
        Action::Transfer { amount: 0, .. } => Err(MultisigEngineErrorKind::bad_param("amount")),
        Action::Fa12Transfer { transfer_unit, .. } => match transfer_unit.txs() {
            [tx] if tx.amount() > 0 => Ok(()),
            [_] => Err(MultisigEngineErrorKind::bad_param("amount")),
            _ => Err(MultisigEngineErrorKind::bad_param("txs")),
        },
        Action::Fa2Transfer { transfer_units, .. } => {
            if transfer_units.is_empty() {
                return Err(MultisigEngineErrorKind::bad_param("transfer_units"));
            }

            if transfer_units.iter().any(|unit| unit.txs().is_empty()) {
                return Err(MultisigEngineErrorKind::bad_param("txs"));
            }

            Ok(())
        },
        Action::StorageUpdate { threshold, keys } => validate_owners(*threshold, keys.len()),
        Action::VestingVest { ticks: 0, .. } => Err(MultisigEngineErrorKind::bad_param("ticks")),
        Action::IncomeTransfer { .. }
        | Action::IncomeFa12Transfer { .. }
        | Action::IncomeFa2Transfer { .. } => Err(MultisigEngineErrorKind::bad_param("type")),
        _ => Ok(()),
    }
}

/// Checks a threshold against the size of the owner set.
pub fn validate_owners(threshold: u64, owners: usize) -> Result<(), MultisigEngineErrorKind> {
    if owners > MAX_KEYS {
        return Err(MultisigEngineErrorKind::bad_param("keys"));
    }

    if threshold == 0 || threshold > owners as u64 {
        return Err(MultisigEngineErrorKind::bad_param("threshold"));
    }

    Ok(())
}

/// Builds the argument the multisig passes to the action's arm.
///
/// `contract` is the multisig itself and stands in for token senders left unspecified.
pub fn build_action_params(
    action: &Action,
    contract: &Address,
) -> Result<Prim, MultisigEngineErrorKind> {
    let params = match action {
        Action::Transfer { to, amount } => Prim::pair(address(to), Prim::int(*amount)),
        Action::Delegation { to } => key_hash_option(to.as_ref(), "to")?,
        Action::Fa12Transfer { asset, transfer_unit } => {
            let [tx] = transfer_unit.txs() else {
                return Err(MultisigEngineErrorKind::bad_param("txs"));
            };

            let transfer = Prim::pair(
                address(&transfer_unit.from_or(contract)),
                Prim::pair(address(tx.to()), Prim::int(tx.amount())),
            );

            Prim::pair(address(asset), Prim::left(transfer))
        },
        Action::Fa2Transfer { asset, transfer_units } => {
            let units = transfer_units.iter().map(|unit| fa2_unit(unit, contract)).collect();

            Prim::pair(address(asset), Prim::right(Prim::Seq(units)))
        },
        Action::StorageUpdate { threshold, keys } => storage_params(*threshold, keys),
        Action::CustomPayload { payload } => parse_custom_payload(payload)?,
        Action::VestingVest { vesting_contract, ticks } => {
            Prim::pair(address(vesting_contract), Prim::right(Prim::int(*ticks)))
        },
        Action::VestingSetDelegate { vesting_contract, delegate } => Prim::pair(
            address(vesting_contract),
            Prim::left(key_hash_option(delegate.as_ref(), "delegate")?),
        ),
        Action::IncomeTransfer { .. }
        | Action::IncomeFa12Transfer { .. }
        | Action::IncomeFa2Transfer { .. } => {
            return Err(MultisigEngineErrorKind::other("income actions have no contract call"));
        },
    };

    Ok(params)
}

/// `Pair threshold { key ; ... }`, shared by storage updates and initial storage.
pub fn storage_params(threshold: u64, keys: &[PubKey]) -> Prim {
    let keys = keys.iter().map(|key| Prim::bytes(key.to_bytes())).collect();

    Prim::pair(Prim::int(threshold), Prim::Seq(keys))
}

/// Reads a lambda given as Micheline JSON or as forged hex with a `0x` prefix.
///
/// A leading watermark byte in the hex form is dropped.
pub fn parse_custom_payload(text: &str) -> Result<Prim, MultisigEngineErrorKind> {
    let text = text.trim();

    if text.starts_with("0x") {
        return text
            .parse::<Payload>()
            .ok()
            .and_then(|payload| payload.to_prim().ok())
            .ok_or(MultisigEngineErrorKind::bad_request("payload"));
    }

    Prim::from_json(text).map_err(|_| MultisigEngineErrorKind::bad_request("payload"))
}

fn address(address: &Address) -> Prim {
    Prim::bytes(address.to_bytes())
}

pub(crate) fn key_hash_option(
    delegate: Option<&Address>,
    field: &'static str,
) -> Result<Prim, MultisigEngineErrorKind> {
    let Some(delegate) = delegate else {
        return Ok(Prim::none());
    };

    delegate
        .to_key_hash_bytes()
        .map(|key_hash| Prim::some(Prim::bytes(key_hash)))
        .map_err(|_| MultisigEngineErrorKind::bad_param(field))
}

fn fa2_unit(unit: &TransferUnit, contract: &Address) -> Prim {
    let txs = unit
        .txs()
        .iter()
        .map(|tx| {
            Prim::pair(address(tx.to()), Prim::pair(Prim::int(tx.token_id()), Prim::int(tx.amount())))
        })
        .collect();

    Prim::pair(address(&unit.from_or(contract)), Prim::Seq(txs))
}

#[cfg(test)]
mod tests {
    use tezos_multisig_coordinator_domain::Tx;
    use tezos_multisig_michelson::OpCode;

    use super::*;
    use crate::error::MultisigEngineErrorKind as Kind;

    const CONTRACT: &str = "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV";
    const RECEIVER: &str = "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH";

    fn contract() -> Address {
        CONTRACT.parse().unwrap()
    }

    fn receiver() -> Address {
        RECEIVER.parse().unwrap()
    }

    #[test]
    fn transfer_pairs_destination_with_amount() {
        let action = Action::Transfer { to: receiver(), amount: 1010 };

        assert_eq!(
            build_action_params(&action, &contract()).unwrap(),
            Prim::pair(Prim::bytes(receiver().to_bytes()), Prim::int(1010))
        );
    }

    #[test]
    fn delegation_uses_key_hash() {
        let to: Address = "tz3Mo3gHekQhCmykfnC58ecqJLXrjMKzkF2Q".parse().unwrap();
        let params = build_action_params(&Action::Delegation { to: Some(to) }, &contract()).unwrap();

        assert_eq!(
            const_hex::encode(params.arg(0).and_then(Prim::as_bytes).unwrap()),
            "02101368afffeb1dc3c089facbbe23f5c30b787ce9"
        );

        let withdraw = build_action_params(&Action::Delegation { to: None }, &contract()).unwrap();
        assert_eq!(withdraw, Prim::none());

        let err = build_action_params(&Action::Delegation { to: Some(contract()) }, &contract());
        assert!(matches!(err, Err(Kind::BadParam(field)) if field == "to"));
    }

    #[test]
    fn fa12_sender_defaults_to_contract() {
        let asset: Address = "KT1WKnsxYnYpTfgCZDuJ9mmv7f6c38Aea9wF".parse().unwrap();
        let unit = TransferUnit::builder()
            .txs(vec![Tx::builder().to(receiver()).amount(110).build()])
            .build();

        let params =
            build_action_params(&Action::Fa12Transfer { asset, transfer_unit: unit }, &contract())
                .unwrap();

        let expected = Prim::pair(
            Prim::bytes(asset.to_bytes()),
            Prim::left(Prim::pair(
                Prim::bytes(contract().to_bytes()),
                Prim::pair(Prim::bytes(receiver().to_bytes()), Prim::int(110)),
            )),
        );
        assert_eq!(params, expected);
    }

    #[test]
    fn fa2_groups_transfers_by_sender() {
        let asset: Address = "KT1WKnsxYnYpTfgCZDuJ9mmv7f6c38Aea9wF".parse().unwrap();
        let unit = TransferUnit::builder()
            .from(receiver())
            .txs(vec![
                Tx::builder().to(contract()).token_id(3).amount(5).build(),
                Tx::builder().to(receiver()).amount(7).build(),
            ])
            .build();

        let params = build_action_params(
            &Action::Fa2Transfer { asset, transfer_units: vec![unit] },
            &contract(),
        )
        .unwrap();

        let units = params.arg(1).and_then(|arm| arm.arg(0)).and_then(Prim::as_seq).unwrap();
        assert!(params.arg(1).unwrap().is(OpCode::D_RIGHT));
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].arg(0), Some(&Prim::bytes(receiver().to_bytes())));

        let txs = units[0].arg(1).and_then(Prim::as_seq).unwrap();
        assert_eq!(txs[0].arg(1), Some(&Prim::pair(Prim::int(3), Prim::int(5))));
        assert_eq!(txs[1].arg(1), Some(&Prim::pair(Prim::int(0), Prim::int(7))));
    }

    #[test]
    fn custom_payload_accepts_json_and_hex() {
        let json = r#"[{"prim":"PUSH","args":[{"prim":"string"},{"string":"Was inserted"}]},{"prim":"FAILWITH"}]"#;
        let hex = "0x05020000001707430368010000000c57617320696e7365727465640327";

        let from_json = parse_custom_payload(json).unwrap();
        let from_hex = parse_custom_payload(hex).unwrap();

        assert_eq!(from_json, from_hex);
        assert!(matches!(parse_custom_payload("not a lambda"), Err(Kind::BadRequest(_))));
        assert!(matches!(parse_custom_payload("0xzz"), Err(Kind::BadRequest(_))));
    }

    #[test]
    fn vesting_arms() {
        let vesting: Address = "KT1WKnsxYnYpTfgCZDuJ9mmv7f6c38Aea9wF".parse().unwrap();

        let vest = build_action_params(
            &Action::VestingVest { vesting_contract: vesting, ticks: 4 },
            &contract(),
        )
        .unwrap();
        assert_eq!(vest, Prim::pair(Prim::bytes(vesting.to_bytes()), Prim::right(Prim::int(4))));

        let set_delegate = build_action_params(
            &Action::VestingSetDelegate { vesting_contract: vesting, delegate: None },
            &contract(),
        )
        .unwrap();
        assert_eq!(
            set_delegate,
            Prim::pair(Prim::bytes(vesting.to_bytes()), Prim::left(Prim::none()))
        );
    }

    #[test]
    fn validation_rejects_unusable_actions() {
        let key: PubKey = "edpkuNVuqdPhCsrYqkq21qW2hYTSZWMjQQjfyogoPZ2AfqCmonziNh".parse().unwrap();

        let cases = [
            (Action::Transfer { to: receiver(), amount: 0 }, "amount"),
            (Action::StorageUpdate { threshold: 2, keys: vec![key.clone()] }, "threshold"),
            (Action::StorageUpdate { threshold: 0, keys: vec![key.clone()] }, "threshold"),
            (Action::StorageUpdate { threshold: 1, keys: vec![key.clone(); 21] }, "keys"),
            (Action::VestingVest { vesting_contract: contract(), ticks: 0 }, "ticks"),
            (Action::IncomeTransfer { from: receiver(), amount: 1 }, "type"),
            (
                Action::Fa2Transfer { asset: contract(), transfer_units: Vec::new() },
                "transfer_units",
            ),
        ];

        for (action, field) in cases {
            assert!(
                matches!(validate_action(&action), Err(Kind::BadParam(f)) if f == field),
                "{action:?}"
            );
        }

        validate_action(&Action::StorageUpdate { threshold: 1, keys: vec![key] }).unwrap();
    }
}
