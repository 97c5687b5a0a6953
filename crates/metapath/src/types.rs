//! Static item-type lattice and result-type analysis.
//!
//! ```text
//! item
//! ├── any-atomic
//! │   ├── string
//! │   ├── boolean
//! │   └── numeric
//! │       └── decimal
//! │           └── integer
//! └── node
//!     ├── document
//!     ├── flag
//!     └── model
//!         ├── assembly
//!         └── field
//! ```

use core::fmt;

use crate::item::{AtomicValue, Item};
use crate::model::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Item,
    AnyAtomic,
    String,
    Boolean,
    Numeric,
    Decimal,
    Integer,
    Node,
    Document,
    Flag,
    Model,
    Assembly,
    Field,
}

impl ItemType {
    pub fn supertype(self) -> Option<ItemType> {
        use ItemType::*;
        match self {
            Item => None,
            AnyAtomic | Node => Some(Item),
            String | Boolean | Numeric => Some(AnyAtomic),
            Decimal => Some(Numeric),
            Integer => Some(Decimal),
            Document | Flag | Model => Some(Node),
            Assembly | Field => Some(Model),
        }
    }

    /// `self` followed by each supertype up to `Item`.
    pub fn ancestors(self) -> impl Iterator<Item = ItemType> {
        core::iter::successors(Some(self), |t| t.supertype())
    }

    pub fn is_subtype_of(self, other: ItemType) -> bool {
        self.ancestors().any(|t| t == other)
    }

    pub fn of_atomic(v: &AtomicValue) -> ItemType {
        match v {
            AtomicValue::String(_) => ItemType::String,
            AtomicValue::Integer(_) => ItemType::Integer,
            AtomicValue::Decimal(_) => ItemType::Decimal,
            AtomicValue::Boolean(_) => ItemType::Boolean,
        }
    }

    pub fn of_node_kind(k: NodeKind) -> ItemType {
        match k {
            NodeKind::Document => ItemType::Document,
            NodeKind::Assembly => ItemType::Assembly,
            NodeKind::Field => ItemType::Field,
            NodeKind::Flag => ItemType::Flag,
        }
    }

    pub fn of_item(item: &Item) -> ItemType {
        match item {
            Item::Atomic(a) => ItemType::of_atomic(a),
            Item::Node(n) => ItemType::of_node_kind(n.kind()),
        }
    }

    pub fn as_str(self) -> &'static str {
        use ItemType::*;
        match self {
            Item => "item()",
            AnyAtomic => "any-atomic-type",
            String => "string",
            Boolean => "boolean",
            Numeric => "numeric",
            Decimal => "decimal",
            Integer => "integer",
            Node => "node()",
            Document => "document-node()",
            Flag => "flag()",
            Model => "model()",
            Assembly => "assembly()",
            Field => "field()",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrowest type every child type is a subtype of, bounded by `base`.
///
/// Falls back to `base` when there are no children, when any child escapes
/// `base`, or when the common ancestor sits above `base`.
pub fn analyze_static_result_type<I>(base: ItemType, children: I) -> ItemType
where
    I: IntoIterator<Item = ItemType>,
{
    let mut iter = children.into_iter();
    let Some(first) = iter.next() else {
        return base;
    };
    if !first.is_subtype_of(base) {
        return base;
    }
    let mut common = first;
    for t in iter {
        if !t.is_subtype_of(base) {
            return base;
        }
        while !t.is_subtype_of(common) {
            match common.supertype() {
                Some(s) => common = s,
                None => return base,
            }
        }
    }
    if common.is_subtype_of(base) { common } else { base }
}
