//! Axis navigation and node tests.

use std::collections::HashSet;

use crate::cst::{Axis, Expr, ExprKind, Wildcard};
use crate::error::{Error, ErrorCode};
use crate::item::{ExpandedName, Item, Sequence};
use crate::model::{NodeId, NodeRef, root_of};

/// What a step keeps from the nodes on its axis.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NodeTest<'a> {
    Any,
    Name(&'a ExpandedName),
    Wildcard(&'a Wildcard),
}

impl<'a> NodeTest<'a> {
    pub(crate) fn from_expr(expr: &'a Expr) -> Result<Self, Error> {
        match expr.kind() {
            ExprKind::Name(n) => Ok(NodeTest::Name(n)),
            ExprKind::Wildcard(w) => Ok(NodeTest::Wildcard(w)),
            _ => Err(Error::defect(format!("'{}' is not a node test", expr.label()))),
        }
    }

    pub(crate) fn matches(self, node: &NodeRef) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Name(expected) => node.name().is_some_and(|n| n == *expected),
            NodeTest::Wildcard(w) => node.name().is_some_and(|n| w.matches(&n)),
        }
    }
}

/// Focus items as nodes; an atomic focus item cannot be navigated.
pub(crate) fn focus_nodes(focus: &Sequence) -> Result<impl Iterator<Item = &NodeRef>, Error> {
    if let Some(Item::Atomic(a)) = focus.iter().find(|i| matches!(i, Item::Atomic(_))) {
        return Err(Error::dynamic(
            ErrorCode::XPTY0020,
            format!("axis step applied to a {} value", a.type_name()),
        ));
    }
    Ok(focus.iter().filter_map(Item::as_node))
}

/// Distinct roots of the focus nodes, for `/` and `//` paths.
pub(crate) fn focus_roots(focus: &Sequence) -> Result<Vec<NodeRef>, Error> {
    if focus.is_empty() {
        return Err(Error::context_empty());
    }
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut out = Vec::new();
    for n in focus_nodes(focus)? {
        let root = root_of(n);
        if seen.insert(root.id()) {
            out.push(root);
        }
    }
    Ok(out)
}

fn push_descendants(node: &NodeRef, out: &mut Vec<NodeRef>) {
    let mut stack: Vec<NodeRef> = node.model_children();
    stack.reverse();
    while let Some(n) = stack.pop() {
        let mut kids = n.model_children();
        kids.reverse();
        out.push(n);
        stack.extend(kids);
    }
}

fn push_ancestors(node: &NodeRef, out: &mut Vec<NodeRef>) {
    let mut cur = node.parent();
    while let Some(p) = cur {
        cur = p.parent();
        out.push(p);
    }
}

/// Nodes on `axis` from `node`. Forward axes come out in document order,
/// reverse axes nearest first.
pub(crate) fn axis_nodes(node: &NodeRef, axis: Axis) -> Vec<NodeRef> {
    let mut out = Vec::new();
    match axis {
        Axis::SelfAxis => out.push(node.clone()),
        Axis::Child => out = node.model_children(),
        Axis::Descendant => push_descendants(node, &mut out),
        Axis::DescendantOrSelf => {
            out.push(node.clone());
            push_descendants(node, &mut out);
        }
        Axis::Parent => out.extend(node.parent()),
        Axis::Ancestor => push_ancestors(node, &mut out),
        Axis::AncestorOrSelf => {
            out.push(node.clone());
            push_ancestors(node, &mut out);
        }
    }
    out
}

/// All focus nodes plus every descendant, the context for `//` paths.
pub(crate) fn descendant_or_self_all(nodes: &[NodeRef]) -> Vec<NodeRef> {
    let mut out = Vec::new();
    for n in nodes {
        out.extend(axis_nodes(n, Axis::DescendantOrSelf));
    }
    out
}
