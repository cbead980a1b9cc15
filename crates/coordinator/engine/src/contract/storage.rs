//! The multisig's own storage: counter, threshold and owner keys.

use tezos_multisig_coordinator_utils::PubKey;
use tezos_multisig_michelson::{Entrypoints, OpCode, Prim, decode_compact};

use super::{field_value, params::storage_params, section, wrong_contract_type};
use crate::error::MultisigEngineErrorKind;

/// Decoded multisig storage.
///
/// Key order is the owner slot order; signatures are matched to slots by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractStorageContainer {
    counter: u64,
    threshold: u64,
    keys: Vec<PubKey>,
}

impl ContractStorageContainer {
    /// Reads `value` using the fields annotated in the storage type.
    ///
    /// The counter may be annotated `%counter` or `%stored_counter`. Keys may be stored as raw
    /// bytes or as base58 strings.
    ///
    /// # Errors
    ///
    /// [`MultisigEngineErrorKind::WrongContractType`] when a field is missing or mistyped, and a
    /// bad param error when the value does not follow the type.
    pub fn from_script(storage_type: &Prim, value: &Prim) -> Result<Self, MultisigEngineErrorKind> {
        let entrypoints = Entrypoints::resolve(section(storage_type));
        let value = section(value);

        let counter = field_value(&entrypoints, value, counter_field(&entrypoints), OpCode::T_NAT)?
            .as_u64()
            .ok_or_else(wrong_contract_type)?;

        let threshold = field_value(&entrypoints, value, "threshold", OpCode::T_NAT)?
            .as_u64()
            .ok_or_else(wrong_contract_type)?;

        let keys = field_value(&entrypoints, value, "keys", OpCode::T_LIST)?;
        let keys = keys
            .as_seq()
            .ok_or_else(wrong_contract_type)?
            .iter()
            .map(|key| PubKey::from_prim(key).map_err(|_| wrong_contract_type()))
            .collect::<Result<_, _>>()?;

        Ok(Self { counter, threshold, keys })
    }

    /// Reads type and value from the indexer's compact binary form.
    ///
    /// # Errors
    ///
    /// As [`Self::from_script`]; bytes that do not decode are a wrong contract type too.
    pub fn from_raw(storage_type: &[u8], value: &[u8]) -> Result<Self, MultisigEngineErrorKind> {
        let decode = |bytes: &[u8]| {
            decode_compact(bytes).map_err(|e| {
                tracing::debug!("undecodable storage: {e}");
                wrong_contract_type()
            })
        };

        Self::from_script(&decode(storage_type)?, &decode(value)?)
    }

    /// Returns the next counter the contract accepts.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Returns the number of signatures a call needs.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Returns the owner keys in slot order.
    pub fn keys(&self) -> &[PubKey] {
        &self.keys
    }

    /// Returns the slot of `key`, if it is an owner.
    pub fn contains(&self, key: &PubKey) -> Option<u32> {
        self.keys.iter().position(|owner| owner == key).and_then(|index| u32::try_from(index).ok())
    }
}

fn counter_field(entrypoints: &Entrypoints<'_>) -> &'static str {
    if entrypoints.get("counter").is_none() && entrypoints.get("stored_counter").is_some() {
        "stored_counter"
    } else {
        "counter"
    }
}

/// Initial storage of a new multisig: counter `0`, then threshold and keys.
pub fn build_contract_storage(threshold: u64, keys: &[PubKey]) -> Prim {
    Prim::pair(Prim::int(0), storage_params(threshold, keys))
}

#[cfg(test)]
mod tests {
    use tezos_multisig_michelson::encode_compact;

    use super::*;

    fn keys() -> Vec<PubKey> {
        [
            "edpkuNVuqdPhCsrYqkq21qW2hYTSZWMjQQjfyogoPZ2AfqCmonziNh",
            "p2pk64iwFyjuvy1SYwkMXeM5GwYGdqQZPwwBViGvhkqM7nGyEwgjpM7",
            "sppk7d8CHGV9SCVDi9ciUVAyGTSLExWRSBAJN4vcFpqWEYbWf9ZNr8D",
        ]
        .into_iter()
        .map(|key| key.parse().unwrap())
        .collect()
    }

    fn annotated(prim: Prim, anno: &str) -> Prim {
        prim.with_annots(vec![anno.to_string()])
    }

    fn storage_type(counter: &str) -> Prim {
        Prim::binary(
            OpCode::T_PAIR,
            annotated(Prim::nullary(OpCode::T_NAT), counter),
            Prim::binary(
                OpCode::T_PAIR,
                annotated(Prim::nullary(OpCode::T_NAT), "%threshold"),
                annotated(Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_KEY)), "%keys"),
            ),
        )
    }

    #[test]
    fn initial_storage_matches_reference_json() {
        let storage = build_contract_storage(1, &keys());

        let expected: serde_json::Value = serde_json::from_str(
            r#"{"args":[{"int":"0"},{"args":[{"int":"1"},[{"bytes":"005ffdd5422addf020a689a1660e1e8c5a0247ed5bfd7ea4f4194b1a2d9f8129cb"},{"bytes":"020213ebf302f60ddcc2168c3d5b2e1f9a9bfef1325682610e1578eecd0ea0846d74"},{"bytes":"0103f713b3d4447a11d5de2c190a67a1164f85b1b265a02331e2b24aee6afbacf286"}]],"prim":"Pair"}],"prim":"Pair"}"#,
        )
        .unwrap();

        let actual: serde_json::Value = serde_json::from_str(&storage.to_json().unwrap()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn reads_fields_through_annotations() {
        let value = Prim::pair(Prim::int(7), storage_params(2, &keys()));

        for counter in ["%counter", "%stored_counter"] {
            let storage = ContractStorageContainer::from_script(&storage_type(counter), &value).unwrap();

            assert_eq!(storage.counter(), 7);
            assert_eq!(storage.threshold(), 2);
            assert_eq!(storage.keys(), keys().as_slice());
            assert_eq!(storage.contains(&keys()[2]), Some(2));
        }
    }

    #[test]
    fn accepts_wrapped_sections_and_string_keys() {
        let storage_type = Prim::unary(OpCode::K_STORAGE, storage_type("%counter"));
        let strings = keys().iter().map(|key| Prim::string(key.to_string())).collect();
        let value = Prim::pair(Prim::int(0), Prim::pair(Prim::int(1), Prim::Seq(strings)));

        let storage = ContractStorageContainer::from_script(&storage_type, &value).unwrap();

        assert_eq!(storage.keys()[1], keys()[1]);
        assert_eq!(storage.contains(&"edpkv13wgJVsEQGiQmw6M2gt9SCu55ajuZDiS9Xyxq375tBUtv8Fjh".parse().unwrap()), None);
    }

    #[test]
    fn reads_compact_binary() {
        let storage_type = encode_compact(&storage_type("%counter")).unwrap();
        let value = encode_compact(&build_contract_storage(3, &keys())).unwrap();

        let storage = ContractStorageContainer::from_raw(&storage_type, &value).unwrap();

        assert_eq!(storage.counter(), 0);
        assert_eq!(storage.threshold(), 3);

        assert!(matches!(
            ContractStorageContainer::from_raw(&storage_type, &[0xff, 0x00]),
            Err(MultisigEngineErrorKind::BadParam(field)) if field == "wrong contract type"
        ));
    }

    #[test]
    fn rejects_other_contracts() {
        let not_multisig = Prim::binary(
            OpCode::T_PAIR,
            annotated(Prim::nullary(OpCode::T_NAT), "%counter"),
            annotated(Prim::nullary(OpCode::T_INT), "%threshold"),
        );
        let value = Prim::pair(Prim::int(0), Prim::int(1));

        assert!(matches!(
            ContractStorageContainer::from_script(&not_multisig, &value),
            Err(MultisigEngineErrorKind::WrongContractType(_))
        ));

        assert!(matches!(
            ContractStorageContainer::from_script(&storage_type("%counter"), &Prim::int(0)),
            Err(MultisigEngineErrorKind::BadParam(_))
        ));
    }
}
