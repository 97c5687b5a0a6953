//! Node-item contract consumed by the evaluator.
//!
//! Document trees are supplied from outside; the evaluator only needs node
//! identity, kind, name, typed value and the four navigation primitives.
//! Node kinds follow the Metaschema model: documents contain one root
//! assembly, assemblies contain assemblies and fields (the *model*), and
//! assemblies and fields carry flags.

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::item::{AtomicValue, ExpandedName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Assembly,
    Field,
    Flag,
}

impl NodeKind {
    /// Assemblies and fields appear on the child axis; flags do not.
    pub fn is_model(self) -> bool {
        matches!(self, NodeKind::Assembly | NodeKind::Field)
    }
}

/// Process-unique identity of a node. Two node handles denote the same node
/// exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

pub type NodeRef = Arc<dyn NodeItem>;

pub trait NodeItem: fmt::Debug + Send + Sync {
    fn id(&self) -> NodeId;
    fn kind(&self) -> NodeKind;
    /// Documents are unnamed.
    fn name(&self) -> Option<ExpandedName>;
    /// Typed value; `None` for documents and assemblies.
    fn value(&self) -> Option<AtomicValue>;

    fn parent(&self) -> Option<NodeRef>;
    /// Assemblies and fields, in document order.
    fn model_children(&self) -> Vec<NodeRef>;
    fn flags(&self) -> Vec<NodeRef>;

    fn string_value(&self) -> String {
        match self.value() {
            Some(v) => v.as_string(),
            None => self.model_children().iter().map(|c| c.string_value()).collect(),
        }
    }

    /// Position among the parent's flags followed by its model children;
    /// `None` for a root. Adapters that know the position should override
    /// this, the default scans the parent's lists.
    fn sibling_index(&self) -> Option<usize> {
        let parent = self.parent()?;
        let id = self.id();
        parent.flags().iter().chain(parent.model_children().iter()).position(|n| n.id() == id)
    }

    fn doc_order_key(&self) -> DocOrderKey {
        doc_order_key_by_ancestry(self)
    }

    fn compare_document_order(&self, other: &dyn NodeItem) -> Ordering {
        if self.id() == other.id() {
            return Ordering::Equal;
        }
        self.doc_order_key().cmp(&other.doc_order_key()).then_with(|| self.id().cmp(&other.id()))
    }
}

/// Sort key for document order.
///
/// - An ancestor precedes its descendants.
/// - Among siblings, flags precede model children; each group keeps the
///   order reported by the adapter.
/// - Separate trees are ordered by the identity of their roots. That order is
///   stable for as long as the trees live, but otherwise arbitrary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocOrderKey {
    root: NodeId,
    path: SmallVec<[usize; 8]>,
}

impl DocOrderKey {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Sibling index at each level below the root.
    pub fn path(&self) -> &[usize] {
        &self.path
    }
}

pub fn doc_order_key_by_ancestry<N: NodeItem + ?Sized>(n: &N) -> DocOrderKey {
    let mut path: SmallVec<[usize; 8]> = SmallVec::new();
    let mut root = n.id();
    let mut index = n.sibling_index();
    let mut cur = n.parent();
    while let Some(p) = cur {
        path.push(index.unwrap_or(usize::MAX));
        root = p.id();
        index = p.sibling_index();
        cur = p.parent();
    }
    path.reverse();
    DocOrderKey { root, path }
}

/// Walk to the top-most ancestor (usually a document node).
pub fn root_of(n: &NodeRef) -> NodeRef {
    let mut cur = n.clone();
    while let Some(p) = cur.parent() {
        cur = p;
    }
    cur
}
