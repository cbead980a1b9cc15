//! Annotation-driven field lookup inside type trees.

use std::collections::{HashMap, hash_map};

use crate::{OpCode, Prim};

/// One step from a node towards one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// First child, or `Left` arm of an `or`.
    Left,
    /// Second child, or `Right` arm of an `or`.
    Right,
}

/// An annotated node found while walking a type tree.
#[derive(Debug, Clone)]
pub struct Entrypoint<'a> {
    id: usize,
    branch: Vec<Direction>,
    prim: &'a Prim,
}

/// Annotated nodes of a type tree keyed by their normalized name.
///
/// Names are lower-cased with underscores removed, so `token_id`, `tokenId` and `tokenid` all
/// resolve to `tokenid`. When two nodes normalize to the same name the one visited last wins.
#[derive(Debug, Clone, Default)]
pub struct Entrypoints<'a> {
    entries: HashMap<String, Entrypoint<'a>>,
}

/// Reasons a required field is not usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntrypointError {
    /// No node carries the annotation.
    #[error("missing field `{0}`")]
    Missing(String),

    /// The annotated node has a different type.
    #[error("field `{name}` is `{found}`, expected `{expected}`")]
    UnexpectedType {
        /// Normalized field name.
        name: String,
        /// Required opcode.
        expected: OpCode,
        /// Opcode found, or `?` for a literal.
        found: String,
    },
}

impl<'a> Entrypoint<'a> {
    /// Visit order of the annotated node.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Path from the root to the node.
    pub fn branch(&self) -> &[Direction] {
        &self.branch
    }

    /// Opcode of the node, `None` for literals.
    pub fn opcode(&self) -> Option<OpCode> {
        self.prim.op()
    }

    /// The annotated node inside the source tree.
    pub fn prim(&self) -> &'a Prim {
        self.prim
    }
}

impl<'a> Entrypoints<'a> {
    /// Walks `root` depth-first, pre-order, and records every annotated node.
    pub fn resolve(root: &'a Prim) -> Self {
        let mut entrypoints = Self::default();
        let mut next_id = 0;
        visit(root, &mut Vec::new(), &mut entrypoints.entries, &mut next_id);
        entrypoints
    }

    /// Looks up a field by name. The name is normalized first.
    pub fn get(&self, name: &str) -> Option<&Entrypoint<'a>> {
        self.entries.get(&normalize(name))
    }

    /// Looks up a field and checks its opcode.
    pub fn field(&self, name: &str, expected: OpCode) -> Result<&Entrypoint<'a>, EntrypointError> {
        let entrypoint = self.get(name).ok_or_else(|| EntrypointError::Missing(normalize(name)))?;

        if entrypoint.opcode() != Some(expected) {
            return Err(EntrypointError::UnexpectedType {
                name: normalize(name),
                expected,
                found: entrypoint.opcode().map_or_else(|| "?".to_string(), |op| op.to_string()),
            });
        }

        Ok(entrypoint)
    }

    /// Checks every `(name, opcode)` pair, failing on the first mismatch.
    pub fn require(&self, fields: &[(&str, OpCode)]) -> Result<(), EntrypointError> {
        fields.iter().try_for_each(|&(name, op)| self.field(name, op).map(|_| ()))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no annotated node was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over names and entrypoints in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Entrypoint<'a>> {
        self.entries.iter()
    }
}

fn visit<'a>(
    prim: &'a Prim,
    path: &mut Vec<Direction>,
    entries: &mut HashMap<String, Entrypoint<'a>>,
    next_id: &mut usize,
) {
    if let Some(anno) = prim.anno() {
        entries.insert(normalize(anno), Entrypoint { id: *next_id, branch: path.clone(), prim });
        *next_id += 1;
    }

    let args = prim.args();

    for (index, child) in args.iter().enumerate() {
        let depth = path.len();
        push_steps(path, index, args.len(), child);
        visit(child, path, entries, next_id);
        path.truncate(depth);
    }
}

fn push_steps(path: &mut Vec<Direction>, index: usize, len: usize, child: &Prim) {
    // a first child already tagged `Right` keeps the arm it was encoded with
    if index == 0 {
        path.push(if child.is(OpCode::D_RIGHT) { Direction::Right } else { Direction::Left });
        return;
    }

    // children of a flattened comb sit at their right-nested position
    path.extend(std::iter::repeat_n(Direction::Right, index));
    if index + 1 < len {
        path.push(Direction::Left);
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    use Direction::{Left as L, Right as R};

    fn annotated(op: OpCode, anno: &str) -> Prim {
        Prim::nullary(op).with_annots(vec![anno.to_string()])
    }

    fn multisig_storage_type() -> Prim {
        Prim::binary(
            OpCode::T_PAIR,
            annotated(OpCode::T_NAT, "%stored_counter"),
            Prim::binary(
                OpCode::T_PAIR,
                annotated(OpCode::T_NAT, "%threshold"),
                Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_KEY))
                    .with_annots(vec!["%keys".to_string()]),
            ),
        )
    }

    #[test]
    fn records_paths_of_annotated_nodes() {
        let storage = multisig_storage_type();
        let entrypoints = Entrypoints::resolve(&storage);

        assert_eq!(entrypoints.len(), 3);
        assert_eq!(entrypoints.get("storedcounter").unwrap().branch(), [L]);
        assert_eq!(entrypoints.get("threshold").unwrap().branch(), [R, L]);

        let keys = entrypoints.get("keys").unwrap();
        assert_eq!(keys.branch(), [R, R]);
        assert_eq!(keys.opcode(), Some(OpCode::T_LIST));
        assert_eq!(keys.id(), 2);
    }

    #[test]
    fn lookup_normalizes_names() {
        let storage = multisig_storage_type();
        let entrypoints = Entrypoints::resolve(&storage);

        assert!(entrypoints.get("Stored_Counter").is_some());
        assert!(entrypoints.field("threshold", OpCode::T_NAT).is_ok());
        assert_eq!(
            entrypoints.field("threshold", OpCode::T_INT).unwrap_err(),
            EntrypointError::UnexpectedType {
                name: "threshold".into(),
                expected: OpCode::T_INT,
                found: "nat".into()
            }
        );
        assert_eq!(
            entrypoints.require(&[("keys", OpCode::T_LIST), ("counter", OpCode::T_NAT)]),
            Err(EntrypointError::Missing("counter".into()))
        );
    }

    #[test]
    fn later_duplicates_overwrite_earlier_ones() {
        let tree = Prim::binary(
            OpCode::T_OR,
            annotated(OpCode::T_NAT, ":value"),
            annotated(OpCode::T_INT, "%value"),
        );

        let entrypoints = Entrypoints::resolve(&tree);
        let value = entrypoints.get("value").unwrap();

        assert_eq!(value.branch(), [R]);
        assert_eq!(value.opcode(), Some(OpCode::T_INT));
    }

    #[test]
    fn first_child_tagged_right_keeps_right() {
        let tree = Prim::binary(
            OpCode::D_PAIR,
            Prim::right(Prim::int(1)).with_annots(vec!["%a".to_string()]),
            annotated(OpCode::D_UNIT, "%b"),
        );

        let entrypoints = Entrypoints::resolve(&tree);

        assert_eq!(entrypoints.get("a").unwrap().branch(), [R]);
        assert_eq!(entrypoints.get("b").unwrap().branch(), [R]);
    }

    #[test]
    fn comb_children_get_right_nested_paths() {
        let tree = Prim::new(
            OpCode::T_PAIR,
            vec![
                annotated(OpCode::T_NAT, "%a"),
                annotated(OpCode::T_NAT, "%b"),
                annotated(OpCode::T_NAT, "%c"),
                annotated(OpCode::T_NAT, "%d"),
            ],
            vec![],
        );

        let entrypoints = Entrypoints::resolve(&tree);

        assert_eq!(entrypoints.get("a").unwrap().branch(), [L]);
        assert_eq!(entrypoints.get("b").unwrap().branch(), [R, L]);
        assert_eq!(entrypoints.get("c").unwrap().branch(), [R, R, L]);
        assert_eq!(entrypoints.get("d").unwrap().branch(), [R, R, R]);
    }

    #[test]
    fn resolving_twice_is_deterministic() {
        let storage = multisig_storage_type();
        let first = Entrypoints::resolve(&storage);
        let second = Entrypoints::resolve(&storage);

        for (name, entrypoint) in first.iter() {
            let other = second.get(name).unwrap();
            assert_eq!(entrypoint.branch(), other.branch());
            assert_eq!(entrypoint.opcode(), other.opcode());
        }
    }
}
