//! Simple in-memory Metaschema tree implementing [`NodeItem`], used in tests,
//! benches and quick prototypes.
//!
//! - Ergonomic bottom-up builder
//! - Document order from ancestry and sibling positions recorded at build time
//! - Thread-safe (`Arc` + `OnceLock`), so trees can be shared across evaluator threads
//!
//! ```
//! use metapath::simple_node::{assembly, doc, field, flag};
//! use metapath::model::NodeItem;
//!
//! // <catalog id="c1"><title>Demo</title><group><control id="ac-1"/></group></catalog>
//! let document = doc()
//!     .child(
//!         assembly("catalog")
//!             .flag(flag("id", "c1"))
//!             .child(field("title", "Demo"))
//!             .child(assembly("group").child(assembly("control").flag(flag("id", "ac-1")))),
//!     )
//!     .build();
//!
//! let catalog = document.model_children()[0].clone();
//! assert_eq!(catalog.name().unwrap().local, "catalog");
//! assert_eq!(catalog.flags().len(), 1);
//! assert_eq!(document.string_value(), "Demo");
//! ```
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::item::{AtomicValue, ExpandedName};
use crate::model::{NodeId, NodeItem, NodeKind, NodeRef};

struct Inner {
    kind: NodeKind,
    name: Option<ExpandedName>,
    value: Option<AtomicValue>,
    parent: OnceLock<(Weak<Inner>, usize)>,
    flags: Vec<SimpleNode>,
    children: Vec<SimpleNode>,
}

/// An `Arc`-backed node. Clones share identity.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("value", &self.0.value)
            .finish()
    }
}

impl SimpleNode {
    pub fn document() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Document, None, None)
    }

    pub fn assembly(name: impl Into<ExpandedName>) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Assembly, Some(name.into()), None)
    }

    pub fn field(name: impl Into<ExpandedName>, value: impl Into<AtomicValue>) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Field, Some(name.into()), Some(value.into()))
    }

    pub fn flag(name: impl Into<ExpandedName>, value: impl Into<AtomicValue>) -> SimpleNode {
        SimpleNodeBuilder::new(NodeKind::Flag, Some(name.into()), Some(value.into())).build()
    }

    /// Wrap into the shared handle the evaluator works with.
    pub fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }

    pub fn to_item(&self) -> crate::item::Item {
        crate::item::Item::Node(self.clone().into_ref())
    }
}

pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<ExpandedName>,
    value: Option<AtomicValue>,
    flags: Vec<SimpleNode>,
    children: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<ExpandedName>, value: Option<AtomicValue>) -> Self {
        Self { kind, name, value, flags: Vec::new(), children: Vec::new() }
    }

    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        let node = child.into().into_node();
        debug_assert!(node.0.kind.is_model(), "only assemblies and fields are model children");
        self.children.push(node);
        self
    }

    pub fn children<I>(mut self, it: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SimpleNodeOrBuilder>,
    {
        for c in it {
            self = self.child(c);
        }
        self
    }

    pub fn flag(mut self, flag: SimpleNode) -> Self {
        debug_assert!(flag.0.kind == NodeKind::Flag);
        self.flags.push(flag);
        self
    }

    pub fn value(mut self, v: impl Into<AtomicValue>) -> Self {
        if matches!(self.kind, NodeKind::Field | NodeKind::Flag) {
            self.value = Some(v.into());
        }
        self
    }

    pub fn build(self) -> SimpleNode {
        let node = SimpleNode(Arc::new(Inner {
            kind: self.kind,
            name: self.name,
            value: self.value,
            parent: OnceLock::new(),
            flags: self.flags,
            children: self.children,
        }));
        for (i, c) in node.0.flags.iter().chain(node.0.children.iter()).enumerate() {
            let attached = c.0.parent.set((Arc::downgrade(&node.0), i)).is_ok();
            debug_assert!(attached, "node attached to two parents");
        }
        node
    }
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl SimpleNodeOrBuilder {
    fn into_node(self) -> SimpleNode {
        match self {
            SimpleNodeOrBuilder::Built(n) => n,
            SimpleNodeOrBuilder::Builder(b) => b.build(),
        }
    }
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}

impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

// Convenience helpers for concise test code
pub fn doc() -> SimpleNodeBuilder {
    SimpleNode::document()
}
pub fn assembly(name: &str) -> SimpleNodeBuilder {
    SimpleNode::assembly(name)
}
pub fn field(name: &str, value: impl Into<AtomicValue>) -> SimpleNodeBuilder {
    SimpleNode::field(name, value)
}
pub fn flag(name: &str, value: impl Into<AtomicValue>) -> SimpleNode {
    SimpleNode::flag(name, value)
}

impl NodeItem for SimpleNode {
    fn id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.0) as usize)
    }
    fn kind(&self) -> NodeKind {
        self.0.kind
    }
    fn name(&self) -> Option<ExpandedName> {
        self.0.name.clone()
    }
    fn value(&self) -> Option<AtomicValue> {
        self.0.value.clone()
    }
    fn parent(&self) -> Option<NodeRef> {
        self.0.parent.get().and_then(|(p, _)| p.upgrade()).map(|inner| SimpleNode(inner).into_ref())
    }
    fn sibling_index(&self) -> Option<usize> {
        self.0.parent.get().map(|(_, i)| *i)
    }
    fn model_children(&self) -> Vec<NodeRef> {
        self.0.children.iter().cloned().map(SimpleNode::into_ref).collect()
    }
    fn flags(&self) -> Vec<NodeRef> {
        self.0.flags.iter().cloned().map(SimpleNode::into_ref).collect()
    }
}
