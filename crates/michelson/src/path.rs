use crate::{Direction, OpCode, Prim};

/// Position inside a value tree. A flattened comb is viewed as its right-nested form without
/// rebuilding it.
#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Prim(&'a Prim),
    Comb { op: OpCode, args: &'a [Prim] },
}

/// Reads the node at `path` inside `root`.
///
/// Unary nodes are entered whatever the direction, so an `or` value can be walked with the path
/// of either arm. Binary nodes select their first or second argument. Nodes with more than two
/// arguments are treated as right combs: `Left` selects the first argument, `Right` the comb of
/// the remaining ones.
///
/// Returns `None` when the path runs into a leaf before it is exhausted.
pub fn select(root: &Prim, path: &[Direction]) -> Option<Prim> {
    path.iter().try_fold(Node::Prim(root), |node, &direction| step(node, direction)).map(materialize)
}

fn step(node: Node<'_>, direction: Direction) -> Option<Node<'_>> {
    let (op, args) = match node {
        Node::Prim(Prim::Unary { arg, .. }) => return Some(Node::Prim(arg)),
        Node::Prim(Prim::Binary { args, .. }) => {
            let index = match direction {
                Direction::Left => 0,
                Direction::Right => 1,
            };
            return Some(Node::Prim(&args[index]));
        },
        Node::Prim(Prim::Nary { op, args, .. }) => (*op, args.as_slice()),
        Node::Comb { op, args } => (op, args),
        Node::Prim(_) => return None,
    };

    match (direction, args) {
        (Direction::Left, [first, ..]) => Some(Node::Prim(first)),
        (Direction::Right, [_, last]) => Some(Node::Prim(last)),
        (Direction::Right, [_, rest @ ..]) if !rest.is_empty() => Some(Node::Comb { op, args: rest }),
        _ => None,
    }
}

fn materialize(node: Node<'_>) -> Prim {
    match node {
        Node::Prim(prim) => prim.clone(),
        Node::Comb { op, args } => fold_comb(op, args),
    }
}

fn fold_comb(op: OpCode, args: &[Prim]) -> Prim {
    match args {
        [] => Prim::nullary(op),
        [single] => single.clone(),
        [first, rest @ ..] => Prim::binary(op, first.clone(), fold_comb(op, rest)),
    }
}
