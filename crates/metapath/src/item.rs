//! Result model: atomic values, items and sequences.

use core::fmt;

use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::model::NodeRef;

/// A namespace-qualified name. `ns_uri == None` means "no namespace".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self { ns_uri, local: local.into() }
    }

    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self { ns_uri: None, local: local.into() }
    }

    pub fn ns(ns_uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self { ns_uri: Some(ns_uri.into()), local: local.into() }
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns_uri {
            Some(ns) => write!(f, "Q{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl From<&str> for ExpandedName {
    fn from(local: &str) -> Self {
        ExpandedName::local(local)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomicValue {
    String(String),
    Integer(BigInt),
    Decimal(Decimal),
    Boolean(bool),
}

impl AtomicValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicValue::String(_) => "string",
            AtomicValue::Integer(_) => "integer",
            AtomicValue::Decimal(_) => "decimal",
            AtomicValue::Boolean(_) => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, AtomicValue::Integer(_) | AtomicValue::Decimal(_))
    }

    /// Canonical lexical form. Decimals keep their scale (`1.10` stays `1.10`).
    pub fn as_string(&self) -> String {
        match self {
            AtomicValue::String(s) => s.clone(),
            AtomicValue::Integer(i) => i.to_string(),
            AtomicValue::Decimal(d) => d.to_string(),
            AtomicValue::Boolean(b) => if *b { "true".into() } else { "false".into() },
        }
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicValue::String(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.as_string()),
        }
    }
}

impl From<bool> for AtomicValue {
    fn from(b: bool) -> Self {
        AtomicValue::Boolean(b)
    }
}

impl From<&str> for AtomicValue {
    fn from(s: &str) -> Self {
        AtomicValue::String(s.to_string())
    }
}

impl From<String> for AtomicValue {
    fn from(s: String) -> Self {
        AtomicValue::String(s)
    }
}

impl From<i64> for AtomicValue {
    fn from(i: i64) -> Self {
        AtomicValue::Integer(BigInt::from(i))
    }
}

impl From<BigInt> for AtomicValue {
    fn from(i: BigInt) -> Self {
        AtomicValue::Integer(i)
    }
}

impl From<Decimal> for AtomicValue {
    fn from(d: Decimal) -> Self {
        AtomicValue::Decimal(d)
    }
}

#[derive(Debug, Clone)]
pub enum Item {
    Atomic(AtomicValue),
    Node(NodeRef),
}

impl Item {
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Item::Node(n) => Some(n),
            Item::Atomic(_) => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            Item::Atomic(a) => Some(a),
            Item::Node(_) => None,
        }
    }

    /// String value: lexical form of an atomic, `string_value()` of a node.
    pub fn string_value(&self) -> String {
        match self {
            Item::Atomic(a) => a.as_string(),
            Item::Node(n) => n.string_value(),
        }
    }
}

/// Nodes compare by identity, atomics by value.
impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Atomic(a), Item::Atomic(b)) => a == b,
            (Item::Node(a), Item::Node(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl From<AtomicValue> for Item {
    fn from(a: AtomicValue) -> Self {
        Item::Atomic(a)
    }
}

impl From<NodeRef> for Item {
    fn from(n: NodeRef) -> Self {
        Item::Node(n)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Atomic(a) => write!(f, "{a}"),
            Item::Node(n) => match n.name() {
                Some(name) => write!(f, "{:?}({})", n.kind(), name),
                None => write!(f, "{:?}", n.kind()),
            },
        }
    }
}

pub type Sequence = Vec<Item>;
