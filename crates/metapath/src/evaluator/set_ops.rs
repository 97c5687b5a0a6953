use std::collections::HashSet;

use crate::error::{Error, ErrorCode};
use crate::item::{Item, Sequence};
use crate::model::{NodeId, NodeRef};

/// Extract nodes; any atomic item is an `XPTY0004` for set operators.
pub(crate) fn nodes_of(seq: Sequence, operator: &str) -> Result<Vec<NodeRef>, Error> {
    seq.into_iter()
        .map(|item| match item {
            Item::Node(n) => Ok(n),
            Item::Atomic(a) => Err(Error::dynamic(
                ErrorCode::XPTY0004,
                format!("'{operator}' operand contains a {} value, not a node", a.type_name()),
            )),
        })
        .collect()
}

/// Remove duplicates by identity, then sort into document order.
pub(crate) fn doc_order_distinct(nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    let mut seen: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
    let mut out: Vec<NodeRef> = nodes.into_iter().filter(|n| seen.insert(n.id())).collect();
    out.sort_by_cached_key(|n| n.doc_order_key());
    out
}

pub(crate) fn to_sequence(nodes: Vec<NodeRef>) -> Sequence {
    nodes.into_iter().map(Item::Node).collect()
}

pub(crate) fn union(operands: Vec<Sequence>) -> Result<Sequence, Error> {
    let mut all: Vec<NodeRef> = Vec::new();
    for seq in operands {
        all.extend(nodes_of(seq, "union")?);
    }
    Ok(to_sequence(doc_order_distinct(all)))
}

pub(crate) fn intersect(left: Sequence, right: Sequence) -> Result<Sequence, Error> {
    let l = nodes_of(left, "intersect")?;
    let r: HashSet<NodeId> = nodes_of(right, "intersect")?.iter().map(|n| n.id()).collect();
    let kept: Vec<NodeRef> = l.into_iter().filter(|n| r.contains(&n.id())).collect();
    Ok(to_sequence(doc_order_distinct(kept)))
}

pub(crate) fn except(left: Sequence, right: Sequence) -> Result<Sequence, Error> {
    let l = nodes_of(left, "except")?;
    let r: HashSet<NodeId> = nodes_of(right, "except")?.iter().map(|n| n.id()).collect();
    let kept: Vec<NodeRef> = l.into_iter().filter(|n| !r.contains(&n.id())).collect();
    Ok(to_sequence(doc_order_distinct(kept)))
}

/// Normalize a path result: all nodes are sorted and deduplicated, all
/// atomics are kept as is, a mix is `XPTY0018`.
pub(crate) fn path_result(seq: Sequence) -> Result<Sequence, Error> {
    let nodes = seq.iter().filter(|i| matches!(i, Item::Node(_))).count();
    if nodes == 0 {
        return Ok(seq);
    }
    if nodes != seq.len() {
        return Err(Error::dynamic(
            ErrorCode::XPTY0018,
            "path result contains both nodes and atomic values",
        ));
    }
    let nodes = seq.into_iter().filter_map(|i| match i {
        Item::Node(n) => Some(n),
        Item::Atomic(_) => None,
    });
    Ok(to_sequence(doc_order_distinct(nodes.collect())))
}
