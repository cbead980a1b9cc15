//! Micheline JSON.

use std::str::FromStr;

use num_bigint::BigInt;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as _,
    ser::{Error as _, SerializeMap},
};
use serde_json::Value;

use crate::{
    OpCode, Prim,
    error::{MichelsonError, Result},
};

impl Prim {
    /// Renders the node as Micheline JSON with keys in a fixed order.
    ///
    /// # Errors
    ///
    /// When the tree contains an opcode outside the primitive table.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(From::from)
    }

    /// Parses Micheline JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    /// Converts a parsed JSON document into a node.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                items.iter().map(Self::from_json_value).collect::<Result<_>>().map(Prim::Seq)
            },
            Value::Object(object) => {
                if let Some(prim) = object.get("prim") {
                    let name = prim.as_str().ok_or(MichelsonError::invalid_json("prim"))?;
                    let op = OpCode::from_name(name)
                        .ok_or_else(|| MichelsonError::UnknownPrimitive(name.to_string().into()))?;

                    let args = match object.get("args") {
                        None | Some(Value::Null) => Vec::new(),
                        Some(Value::Array(args)) => {
                            args.iter().map(Self::from_json_value).collect::<Result<_>>()?
                        },
                        Some(_) => return Err(MichelsonError::invalid_json("args")),
                    };

                    let annots = match object.get("annots") {
                        None | Some(Value::Null) => Vec::new(),
                        Some(Value::Array(annots)) => annots
                            .iter()
                            .map(|a| a.as_str().map(String::from))
                            .collect::<Option<_>>()
                            .ok_or(MichelsonError::invalid_json("annots"))?,
                        Some(_) => return Err(MichelsonError::invalid_json("annots")),
                    };

                    return Ok(Prim::new(op, args, annots));
                }

                if let Some(int) = object.get("int") {
                    let int = match int {
                        Value::String(s) => BigInt::from_str(s).ok(),
                        Value::Number(n) => n.as_i64().map(BigInt::from),
                        _ => None,
                    };

                    return int.map(Prim::Int).ok_or(MichelsonError::invalid_json("int"));
                }

                if let Some(bytes) = object.get("bytes") {
                    let hex = bytes.as_str().ok_or(MichelsonError::invalid_json("bytes"))?;
                    return Ok(Prim::Bytes(const_hex::decode(hex)?));
                }

                if let Some(string) = object.get("string") {
                    let string = string.as_str().ok_or(MichelsonError::invalid_json("string"))?;
                    return Ok(Prim::String(string.to_string()));
                }

                Err(MichelsonError::invalid_json("object is not a micheline node"))
            },
            _ => Err(MichelsonError::invalid_json("expected an object or an array")),
        }
    }
}

impl Serialize for Prim {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Prim::Int(i) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("int", &i.to_string())?;
                map.end()
            },
            Prim::Bytes(b) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("bytes", &const_hex::encode(b))?;
                map.end()
            },
            Prim::String(s) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("string", s)?;
                map.end()
            },
            Prim::Seq(items) => serializer.collect_seq(items),
            Prim::Nullary { op, .. }
            | Prim::Unary { op, .. }
            | Prim::Binary { op, .. }
            | Prim::Nary { op, .. } => {
                let name = op
                    .name()
                    .ok_or_else(|| S::Error::custom(format!("unknown opcode {op}")))?;

                let (args, annots) = (self.args(), self.annots());
                let len = 1 + usize::from(!args.is_empty()) + usize::from(!annots.is_empty());

                let mut map = serializer.serialize_map(Some(len))?;

                if !annots.is_empty() {
                    map.serialize_entry("annots", annots)?;
                }

                if !args.is_empty() {
                    map.serialize_entry("args", args)?;
                }

                map.serialize_entry("prim", name)?;
                map.end()
            },
        }
    }
}

impl<'de> Deserialize<'de> for Prim {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Prim::from_json_value(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_in_fixed_order() {
        let prim = Prim::pair(Prim::int(0), Prim::Seq(vec![Prim::bytes(vec![0xab])]));
        assert_eq!(
            prim.to_json().unwrap(),
            r#"{"args":[{"int":"0"},[{"bytes":"ab"}]],"prim":"Pair"}"#
        );

        let annotated = Prim::nullary(OpCode::T_NAT).with_annots(vec!["%threshold".into()]);
        assert_eq!(annotated.to_json().unwrap(), r#"{"annots":["%threshold"],"prim":"nat"}"#);
    }

    #[test]
    fn parses_node_json() {
        let prim = Prim::from_json(
            r#"[{"prim":"DROP"},{"prim":"NIL","args":[{"prim":"operation"}]},{"string":"x"},{"int":"-7"}]"#,
        )
        .unwrap();

        assert_eq!(
            prim,
            Prim::Seq(vec![
                Prim::nullary(OpCode::I_DROP),
                Prim::unary(OpCode::I_NIL, Prim::nullary(OpCode::T_OPERATION)),
                Prim::string("x"),
                Prim::int(-7),
            ])
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(matches!(Prim::from_json(r#"{"prim":"Nope"}"#), Err(MichelsonError::UnknownPrimitive(_))));
        assert!(matches!(Prim::from_json(r#"{"foo":1}"#), Err(MichelsonError::InvalidJson(_))));
        assert!(matches!(Prim::from_json(r#"{"int":"1x"}"#), Err(MichelsonError::InvalidJson(_))));
        assert!(Prim::from_json("not json").is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let prim = Prim::new(
            OpCode::D_PAIR,
            vec![Prim::int(1), Prim::string("two"), Prim::right(Prim::none())],
            vec!["@v".into()],
        );

        assert_eq!(Prim::from_json(&prim.to_json().unwrap()).unwrap(), prim);
    }

    #[test]
    fn unknown_opcode_cannot_be_rendered() {
        assert!(Prim::nullary(OpCode::new(200)).to_json().is_err());
    }
}
