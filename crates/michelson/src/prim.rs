//! The Micheline node tree.

use core::slice;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::OpCode;

/// A Micheline node.
///
/// Primitive applications are split by argument count so that a node can never carry fewer
/// children than its kind implies. Use [`Prim::new`] to build a primitive from an argument
/// vector of any length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prim {
    /// Arbitrary precision integer literal.
    Int(BigInt),
    /// Byte string literal.
    Bytes(Vec<u8>),
    /// Text literal.
    String(String),
    /// Sequence of nodes.
    Seq(Vec<Prim>),
    /// Primitive without arguments.
    Nullary {
        /// Opcode.
        op: OpCode,
        /// Annotations with their `%`, `:` or `@` marker.
        annots: Vec<String>,
    },
    /// Primitive with one argument.
    Unary {
        /// Opcode.
        op: OpCode,
        /// The single argument.
        arg: Box<Prim>,
        /// Annotations with their `%`, `:` or `@` marker.
        annots: Vec<String>,
    },
    /// Primitive with two arguments.
    Binary {
        /// Opcode.
        op: OpCode,
        /// Left and right argument.
        args: Box<[Prim; 2]>,
        /// Annotations with their `%`, `:` or `@` marker.
        annots: Vec<String>,
    },
    /// Primitive with three or more arguments, such as a flattened `Pair`.
    Nary {
        /// Opcode.
        op: OpCode,
        /// Arguments, never fewer than three.
        args: Vec<Prim>,
        /// Annotations with their `%`, `:` or `@` marker.
        annots: Vec<String>,
    },
}

impl Prim {
    /// Builds a primitive application, picking the variant from the argument count.
    pub fn new(op: OpCode, args: Vec<Prim>, annots: Vec<String>) -> Self {
        let mut args = args.into_iter();

        match (args.next(), args.next(), args.next()) {
            (None, ..) => Self::Nullary { op, annots },
            (Some(arg), None, _) => Self::Unary { op, arg: Box::new(arg), annots },
            (Some(l), Some(r), None) => Self::Binary { op, args: Box::new([l, r]), annots },
            (Some(a), Some(b), Some(c)) => {
                let args = [a, b, c].into_iter().chain(args).collect();
                Self::Nary { op, args, annots }
            },
        }
    }

    /// Integer literal.
    pub fn int<I>(value: I) -> Self
    where
        BigInt: From<I>,
    {
        Self::Int(BigInt::from(value))
    }

    /// Byte string literal.
    pub fn bytes<B>(bytes: B) -> Self
    where
        Vec<u8>: From<B>,
    {
        Self::Bytes(Vec::from(bytes))
    }

    /// Text literal.
    pub fn string<S>(text: S) -> Self
    where
        String: From<S>,
    {
        Self::String(String::from(text))
    }

    /// Primitive without arguments or annotations.
    pub fn nullary(op: OpCode) -> Self {
        Self::Nullary { op, annots: Vec::new() }
    }

    /// Primitive with one argument and no annotations.
    pub fn unary(op: OpCode, arg: Prim) -> Self {
        Self::Unary { op, arg: Box::new(arg), annots: Vec::new() }
    }

    /// Primitive with two arguments and no annotations.
    pub fn binary(op: OpCode, left: Prim, right: Prim) -> Self {
        Self::Binary { op, args: Box::new([left, right]), annots: Vec::new() }
    }

    /// `Pair left right`
    pub fn pair(left: Prim, right: Prim) -> Self {
        Self::binary(OpCode::D_PAIR, left, right)
    }

    /// `Left value`
    pub fn left(value: Prim) -> Self {
        Self::unary(OpCode::D_LEFT, value)
    }

    /// `Right value`
    pub fn right(value: Prim) -> Self {
        Self::unary(OpCode::D_RIGHT, value)
    }

    /// `Some value`
    pub fn some(value: Prim) -> Self {
        Self::unary(OpCode::D_SOME, value)
    }

    /// `None`
    pub fn none() -> Self {
        Self::nullary(OpCode::D_NONE)
    }

    /// Replaces the annotations of a primitive application. Literals are returned unchanged.
    pub fn with_annots(mut self, new_annots: Vec<String>) -> Self {
        match &mut self {
            Self::Nullary { annots, .. }
            | Self::Unary { annots, .. }
            | Self::Binary { annots, .. }
            | Self::Nary { annots, .. } => *annots = new_annots,
            Self::Int(_) | Self::Bytes(_) | Self::String(_) | Self::Seq(_) => {},
        }

        self
    }

    /// Opcode of a primitive application.
    pub fn op(&self) -> Option<OpCode> {
        match self {
            Self::Nullary { op, .. }
            | Self::Unary { op, .. }
            | Self::Binary { op, .. }
            | Self::Nary { op, .. } => Some(*op),
            Self::Int(_) | Self::Bytes(_) | Self::String(_) | Self::Seq(_) => None,
        }
    }

    /// Returns `true` when this node is an application of `op`.
    pub fn is(&self, op: OpCode) -> bool {
        self.op() == Some(op)
    }

    /// Child nodes: primitive arguments, or the items of a sequence.
    pub fn args(&self) -> &[Prim] {
        match self {
            Self::Unary { arg, .. } => slice::from_ref(arg),
            Self::Binary { args, .. } => &args[..],
            Self::Nary { args, .. } | Self::Seq(args) => args,
            Self::Nullary { .. } | Self::Int(_) | Self::Bytes(_) | Self::String(_) => &[],
        }
    }

    /// Child node at `index`.
    pub fn arg(&self, index: usize) -> Option<&Prim> {
        self.args().get(index)
    }

    /// Annotations including their kind marker.
    pub fn annots(&self) -> &[String] {
        match self {
            Self::Nullary { annots, .. }
            | Self::Unary { annots, .. }
            | Self::Binary { annots, .. }
            | Self::Nary { annots, .. } => annots,
            Self::Int(_) | Self::Bytes(_) | Self::String(_) | Self::Seq(_) => &[],
        }
    }

    /// The node's name: its first non-empty annotation with the kind marker removed.
    pub fn anno(&self) -> Option<&str> {
        self.annots()
            .iter()
            .map(|a| a.strip_prefix(['%', ':', '@']).unwrap_or(a))
            .find(|a| !a.is_empty())
    }

    /// Integer value of an `Int` literal.
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Integer value of an `Int` literal when it fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(ToPrimitive::to_i64)
    }

    /// Integer value of an `Int` literal when it fits in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_int().and_then(ToPrimitive::to_u64)
    }

    /// Content of a `Bytes` literal.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Content of a `String` literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a sequence.
    pub fn as_seq(&self) -> Option<&[Prim]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Prim;
    use crate::OpCode;

    #[test]
    fn new_picks_variant_by_arity() {
        assert!(matches!(Prim::new(OpCode::D_UNIT, vec![], vec![]), Prim::Nullary { .. }));
        assert!(matches!(Prim::new(OpCode::D_SOME, vec![Prim::int(1)], vec![]), Prim::Unary { .. }));
        assert!(matches!(
            Prim::new(OpCode::D_PAIR, vec![Prim::int(1), Prim::int(2)], vec![]),
            Prim::Binary { .. }
        ));

        let nary = Prim::new(OpCode::D_PAIR, vec![Prim::int(1), Prim::int(2), Prim::int(3)], vec![]);
        assert!(matches!(nary, Prim::Nary { .. }));
        assert_eq!(nary.args().len(), 3);
    }

    #[test]
    fn anno_strips_marker_and_skips_empty() {
        let prim = Prim::nullary(OpCode::T_NAT)
            .with_annots(vec!["%".to_string(), ":threshold".to_string(), "@x".to_string()]);

        assert_eq!(prim.anno(), Some("threshold"));
        assert_eq!(Prim::nullary(OpCode::T_NAT).anno(), None);
    }
}
